//! Judgment: scoring classifier output against the round's topic.

use serde::Serialize;

use super::{
    entity::{PredictionSubmission, RankedLabel},
    value_object::{ParticipantId, RoomName, Topic},
};

/// Number of ranked labels echoed back per participant.
pub const TOP_LABELS: usize = 3;

/// 勝敗
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Winner(ParticipantId),
    Draw,
    /// 専用ルームでの一人判定
    Solo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgedEntry {
    pub participant: ParticipantId,
    pub display_name: String,
    pub score: f64,
    pub top_labels: Vec<RankedLabel>,
}

/// 1 ラウンドにつき 1 回だけ公開される判定結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgmentResult {
    pub room: RoomName,
    pub topic: Topic,
    pub outcome: Outcome,
    /// 入室順（ホストが先頭）
    pub entries: Vec<JudgedEntry>,
}

/// Confidence of the first label exactly matching `target`, or zero.
pub fn score(ranked_labels: &[RankedLabel], target: &Topic) -> f64 {
    ranked_labels
        .iter()
        .find(|ranked| ranked.label == target.as_str())
        .map(|ranked| ranked.confidence)
        .filter(|confidence| confidence.is_finite() && *confidence > 0.0)
        .unwrap_or(0.0)
}

/// 勝敗を決める
///
/// 全員 0 点、または最高点が並んだ場合は引き分け。
pub fn decide_outcome(entries: &[JudgedEntry]) -> Outcome {
    if entries.len() == 1 {
        return Outcome::Solo;
    }

    let best = entries.iter().map(|e| e.score).fold(0.0_f64, f64::max);
    if best == 0.0 {
        return Outcome::Draw;
    }

    let mut leaders = entries.iter().filter(|e| e.score == best);
    match (leaders.next(), leaders.next()) {
        (Some(leader), None) => Outcome::Winner(leader.participant.clone()),
        _ => Outcome::Draw,
    }
}

/// Scores every submission against `topic` and decides the outcome.
///
/// `submissions` must already be in occupant order.
pub fn judge(
    room: RoomName,
    topic: Topic,
    submissions: Vec<(ParticipantId, PredictionSubmission)>,
) -> JudgmentResult {
    let entries: Vec<JudgedEntry> = submissions
        .into_iter()
        .map(|(participant, submission)| JudgedEntry {
            score: score(&submission.ranked_labels, &topic),
            top_labels: submission
                .ranked_labels
                .into_iter()
                .take(TOP_LABELS)
                .collect(),
            display_name: submission.display_name,
            participant,
        })
        .collect();

    JudgmentResult {
        outcome: decide_outcome(&entries),
        room,
        topic,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(value: &str) -> ParticipantId {
        ParticipantId::new(value.to_string()).unwrap()
    }

    fn topic(value: &str) -> Topic {
        Topic::new(value.to_string()).unwrap()
    }

    fn entry(participant: &str, score: f64) -> JudgedEntry {
        JudgedEntry {
            participant: pid(participant),
            display_name: participant.to_string(),
            score,
            top_labels: Vec::new(),
        }
    }

    fn submission(labels: &[(&str, f64)], name: &str) -> PredictionSubmission {
        PredictionSubmission {
            ranked_labels: labels
                .iter()
                .map(|(label, confidence)| RankedLabel::new(*label, *confidence))
                .collect(),
            target_topic: topic("cat"),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn test_score_uses_matching_label_confidence() {
        // テスト項目: お題と一致するラベルの確信度がスコアになり、無ければ 0
        // given (前提条件):
        let labels = vec![RankedLabel::new("cat", 0.8), RankedLabel::new("dog", 0.1)];

        // when (操作):
        let cat = score(&labels, &topic("cat"));
        let dog = score(&labels, &topic("dog"));
        let fish = score(&labels, &topic("fish"));

        // then (期待する結果):
        assert_eq!(cat, 0.8);
        assert_eq!(dog, 0.1);
        assert_eq!(fish, 0.0);
    }

    #[test]
    fn test_score_takes_first_match_only() {
        // テスト項目: 同じラベルが複数あっても最初の一致だけを使う
        // given (前提条件):
        let labels = vec![RankedLabel::new("cat", 0.4), RankedLabel::new("cat", 0.9)];

        // when (操作):
        let result = score(&labels, &topic("cat"));

        // then (期待する結果):
        assert_eq!(result, 0.4);
    }

    #[test]
    fn test_score_ignores_non_finite_confidence() {
        // テスト項目: NaN の確信度は 0 点として扱う
        // given (前提条件):
        let labels = vec![RankedLabel::new("cat", f64::NAN)];

        // when (操作):
        let result = score(&labels, &topic("cat"));

        // then (期待する結果):
        assert_eq!(result, 0.0);
    }

    #[test]
    fn test_decide_outcome_both_zero_is_draw() {
        // テスト項目: 両者 0 点は引き分け
        // given (前提条件):
        let entries = vec![entry("alice", 0.0), entry("bob", 0.0)];

        // when (操作):
        let outcome = decide_outcome(&entries);

        // then (期待する結果):
        assert_eq!(outcome, Outcome::Draw);
    }

    #[test]
    fn test_decide_outcome_equal_scores_is_draw() {
        // テスト項目: 同点（0 以外）は引き分け
        // given (前提条件):
        let entries = vec![entry("alice", 0.5), entry("bob", 0.5)];

        // when (操作):
        let outcome = decide_outcome(&entries);

        // then (期待する結果):
        assert_eq!(outcome, Outcome::Draw);
    }

    #[test]
    fn test_decide_outcome_higher_score_wins() {
        // テスト項目: 高いスコアの参加者が勝つ（先頭・後方どちらでも）
        // given (前提条件):
        let first_wins = vec![entry("alice", 0.7), entry("bob", 0.3)];
        let second_wins = vec![entry("alice", 0.0), entry("bob", 0.2)];

        // when (操作):
        let first = decide_outcome(&first_wins);
        let second = decide_outcome(&second_wins);

        // then (期待する結果):
        assert_eq!(first, Outcome::Winner(pid("alice")));
        assert_eq!(second, Outcome::Winner(pid("bob")));
    }

    #[test]
    fn test_decide_outcome_single_entry_is_solo() {
        // テスト項目: 一人だけの判定は Solo
        // given (前提条件):
        let entries = vec![entry("alice", 0.9)];

        // when (操作):
        let outcome = decide_outcome(&entries);

        // then (期待する結果):
        assert_eq!(outcome, Outcome::Solo);
    }

    #[test]
    fn test_judge_builds_result_with_top_three_labels() {
        // テスト項目: 判定結果にスコア・表示名・上位 3 ラベルが入る
        // given (前提条件):
        let submissions = vec![
            (
                pid("alice"),
                submission(
                    &[("cat", 0.6), ("dog", 0.2), ("fox", 0.1), ("owl", 0.05)],
                    "Alice",
                ),
            ),
            (pid("bob"), submission(&[("dog", 0.9), ("cat", 0.05)], "Bob")),
        ];

        // when (操作):
        let result = judge(
            RoomName::new("room1".to_string()).unwrap(),
            topic("cat"),
            submissions,
        );

        // then (期待する結果):
        assert_eq!(result.outcome, Outcome::Winner(pid("alice")));
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].display_name, "Alice");
        assert_eq!(result.entries[0].score, 0.6);
        assert_eq!(result.entries[0].top_labels.len(), 3);
        assert_eq!(result.entries[1].score, 0.05);
        assert_eq!(result.entries[1].top_labels.len(), 2);
    }
}
