use crate::card::Card;
use thiserror::Error;

/// 出牌、过牌、开局时可能出现的所有拒绝原因。
/// 所有错误都可以恢复：返回给调用方展示，牌桌状态保持不变。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleError {
    #[error("不是合法的牌型")]
    InvalidCombo,
    #[error("还没轮到你出牌")]
    NotYourTurn,
    #[error("手中没有这张牌: {0}")]
    CardNotInHand(Card),
    #[error("牌局尚未开始")]
    NotStarted,
    #[error("牌局已经结束")]
    GameFinished,
    #[error("压不过桌面上的牌")]
    DoesNotBeatLastCombo,
    #[error("配置错误: {0}")]
    InvalidConfiguration(String),
}
