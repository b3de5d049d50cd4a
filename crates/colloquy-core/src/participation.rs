//! Participation estimate from name mentions.

use regex::RegexBuilder;

use crate::error::Result;
use crate::model::{ParticipantStats, Participation};

/// Count case-insensitive whole-word mentions of each participant.
///
/// Names are matched exactly as given, surrounding whitespace included.
/// Blank names report zero mentions. Repeated names share one entry.
pub fn analyze_participation(transcript: &str, participants: &[String]) -> Result<Participation> {
    let mut participation = Participation::new();

    for name in participants {
        let mentions = if name.trim().is_empty() {
            0
        } else {
            let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(name)))
                .case_insensitive(true)
                .build()?;
            pattern.find_iter(transcript).count()
        };
        participation.insert(name.clone(), ParticipantStats::from_mentions(mentions));
    }

    Ok(participation)
}
