//! Human-readable rendering of service results.

use colloquy_core::{ActionItem, MeetingSummary, Participation, Sentiment};

/// Longest embedding prefix printed in text mode.
const MAX_VECTOR_ITEMS: usize = 8;

pub fn sentiment(s: &Sentiment) -> String {
    format!("{} ({:.3})", s.label, s.score)
}

pub fn action_items(items: &[ActionItem]) -> String {
    if items.is_empty() {
        return "(no action items)".to_string();
    }
    items
        .iter()
        .map(|item| {
            let who = item
                .assignee
                .as_deref()
                .map(|a| format!(" @{a}"))
                .unwrap_or_default();
            format!(
                "{:>3}. [{}] {}{who}  ({})",
                item.id,
                item.priority.as_str(),
                item.text,
                item.kind.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn topics(topics: &[String]) -> String {
    if topics.is_empty() {
        "(no topics)".to_string()
    } else {
        topics.join(", ")
    }
}

pub fn participation(p: &Participation) -> String {
    if p.is_empty() {
        return "(no participants)".to_string();
    }
    let width = p.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    p.iter()
        .map(|(name, stats)| {
            format!(
                "{name:<width$}  {:>4} mentions  ~{}s",
                stats.mentions, stats.estimated_speaking_time
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn embedding(v: &[f32]) -> String {
    if v.is_empty() {
        return "(no embedding)".to_string();
    }
    let head: Vec<String> = v
        .iter()
        .take(MAX_VECTOR_ITEMS)
        .map(|x| format!("{x:.4}"))
        .collect();
    let more = if v.len() > MAX_VECTOR_ITEMS { ", ..." } else { "" };
    format!("dim {}: [{}{more}]", v.len(), head.join(", "))
}

pub fn meeting(m: &MeetingSummary) -> String {
    let mut out = String::new();
    out.push_str("── Summary ──\n");
    out.push_str(&m.summary);
    out.push_str("\n\n── Action items ──\n");
    out.push_str(&action_items(&m.action_items));
    out.push_str("\n\n── Key topics ──\n");
    out.push_str(&topics(&m.key_topics));
    out.push_str("\n\n── Sentiment ──\n");
    out.push_str(&sentiment(&m.sentiment));
    out.push_str("\n\n── Participation ──\n");
    out.push_str(&participation(&m.participation_analysis));
    out.push_str(&format!(
        "\n\n{} words, estimated duration {:.1}",
        m.word_count, m.meeting_duration_estimate
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::{ActionType, ParticipantStats, Priority};

    #[test]
    fn action_item_line() {
        let items = vec![ActionItem {
            id: 2,
            text: "draft the launch plan".into(),
            assignee: Some("dana".into()),
            priority: Priority::High,
            kind: ActionType::Assigned,
        }];
        assert_eq!(
            action_items(&items),
            "  2. [high] draft the launch plan @dana  (assigned)"
        );
    }

    #[test]
    fn empty_sections() {
        assert_eq!(action_items(&[]), "(no action items)");
        assert_eq!(topics(&[]), "(no topics)");
        assert_eq!(participation(&Participation::new()), "(no participants)");
        assert_eq!(embedding(&[]), "(no embedding)");
    }

    #[test]
    fn participation_aligned() {
        let mut p = Participation::new();
        p.insert("Al".into(), ParticipantStats::from_mentions(1));
        p.insert("Beatrix".into(), ParticipantStats::from_mentions(3));
        let out = participation(&p);
        assert!(out.contains("Al          1 mentions  ~5s"));
        assert!(out.contains("Beatrix     3 mentions  ~15s"));
    }

    #[test]
    fn embedding_truncated() {
        let v: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let out = embedding(&v);
        assert!(out.starts_with("dim 10: [0.0000, 1.0000"));
        assert!(out.ends_with(", ...]"));
    }
}
