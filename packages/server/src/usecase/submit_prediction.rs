//! UseCase: 予測結果の提出と判定
//!
//! 全員分の予測がそろった時点で 1 度だけ判定し、`judgment_result` を全員に送る。
//! 判定と予測の破棄は Repository の 1 回のロック内で行われるため、
//! 同時に提出されても結果は 1 ラウンドにつき 1 回しか出ない。

use std::sync::Arc;

use crate::domain::{
    JudgmentResult, MessagePusher, Notification, ParticipantId, PredictionOutcome,
    PredictionSubmission, RoomName, RoomRepository,
};

use super::error::RoomActionError;

/// 予測提出のユースケース
pub struct SubmitPredictionUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SubmitPredictionUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// # Returns
    ///
    /// * `Ok(Some(JudgmentResult))` - この提出で判定が確定した
    /// * `Ok(None)` - 相手の提出待ち
    pub async fn execute(
        &self,
        participant: &ParticipantId,
        room: &RoomName,
        submission: PredictionSubmission,
    ) -> Result<Option<JudgmentResult>, RoomActionError> {
        let outcome = self
            .repository
            .record_prediction(room, participant, submission)
            .await?;

        let PredictionOutcome::Judged { result, recipients } = outcome else {
            tracing::debug!("Prediction from '{}' stored, waiting for peer", participant);
            return Ok(None);
        };

        tracing::info!(
            "Room '{}' judged on '{}': {:?}",
            result.room,
            result.topic,
            result.outcome
        );
        let notification = Notification::JudgmentResult(result.clone());
        if let Err(e) = self.message_pusher.broadcast(recipients, &notification).await {
            tracing::warn!("Failed to broadcast judgment_result: {}", e);
        }
        Ok(Some(result))
    }
}
