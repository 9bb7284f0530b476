//! UseCase: お題の提案と決定
//!
//! 両者の提案がそろった時点で、どちらか一方を等確率で採用する。
//! 片方しか提案しない場合は待ち時間の後にその提案を採用する。
//! 専用ルームでは一人の提案で即座に決まり、新しいラウンドが始まる。
//!
//! ## テスト実装の作業記録
//!
//! ### どのような状況を想定しているか
//! - 正常系：両者の提案で `topic_chosen` が両者に 1 回ずつ届く
//! - 待ち時間切れ：片方の提案だけで決まる
//! - 異常系：ラウンド開始前・決定後の提案は古い要求として破棄

use std::{sync::Arc, time::Duration};

use crate::domain::{
    MessagePusher, Notification, ParticipantId, ProposalOutcome, RoomName, RoomRepository,
    TopicProposal, TopicResolution, TopicResolver,
};

use super::error::RoomActionError;

/// お題提案のユースケース
pub struct ProposeTopicUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    resolver: Arc<TopicResolver>,
    timeout: Duration,
}

impl ProposeTopicUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        resolver: Arc<TopicResolver>,
        timeout: Duration,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            resolver,
            timeout,
        }
    }

    /// お題の提案を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Some(TopicResolution))` - この提案でお題が決まった
    /// * `Ok(None)` - 相手の提案待ち（待ち時間のタイマーを起動済み）
    /// * `Err(RoomActionError)` - 古い要求
    pub async fn execute(
        &self,
        participant: &ParticipantId,
        room: &RoomName,
        proposal: TopicProposal,
    ) -> Result<Option<TopicResolution>, RoomActionError> {
        let outcome = self
            .repository
            .record_topic_proposal(room, participant, proposal, &self.resolver)
            .await?;

        match outcome {
            ProposalOutcome::Resolved(resolution) => {
                announce(self.message_pusher.as_ref(), &resolution).await;
                Ok(Some(resolution))
            }
            ProposalOutcome::Pending { generation } => {
                tracing::debug!(
                    "Topic proposal from '{}' in '{}' is waiting for the peer",
                    participant,
                    room
                );
                self.schedule_timeout(room.clone(), generation);
                Ok(None)
            }
        }
    }

    fn schedule_timeout(&self, room: RoomName, generation: u64) {
        let repository = Arc::clone(&self.repository);
        let message_pusher = Arc::clone(&self.message_pusher);
        let resolver = Arc::clone(&self.resolver);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(resolution) = repository
                .resolve_lone_proposal(&room, generation, &resolver)
                .await
            {
                tracing::info!("Topic for '{}' chosen from a lone proposal", room);
                announce(message_pusher.as_ref(), &resolution).await;
            }
        });
    }
}

async fn announce(message_pusher: &dyn MessagePusher, resolution: &TopicResolution) {
    tracing::info!(
        "Topic '{}' chosen for room '{}' (proposed by '{}')",
        resolution.chosen.topic,
        resolution.room,
        resolution.chosen.chosen_by
    );
    let notification = Notification::TopicChosen {
        room: resolution.room.clone(),
        topic: resolution.chosen.topic.clone(),
        chosen_by: resolution.chosen.chosen_by.clone(),
    };
    if let Err(e) = message_pusher
        .broadcast(resolution.recipients.clone(), &notification)
        .await
    {
        tracing::warn!("Failed to broadcast topic_chosen: {}", e);
    }
}
