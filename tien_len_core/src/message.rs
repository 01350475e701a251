use crate::card::Card;
use crate::combo::Combo;
use crate::state::{PlayerId, Seat, TableId, TableView};
use serde::{Deserialize, Serialize};

// --- 客户端 -> 服务器 的消息 ---
// 这些是客户端可以发送给服务器的指令或动作。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    // --- 牌桌管理消息 ---
    /// 创建一张新牌桌，空座位由电脑玩家补齐
    CreateTable { nickname: String, seats: usize },
    /// 加入一张已存在的牌桌，占用第一个电脑座位
    JoinTable { table_id: TableId, nickname: String },

    // --- 游戏内消息 ---
    /// 开始新的一局 (仅桌主)
    StartRound,
    /// 轮到自己时出牌
    Play { cards: Vec<Card> },
    /// 轮到自己时过牌
    Pass,
    /// 获取自己的手牌
    GetMyHand,
}

// --- 服务器 -> 客户端 的消息 ---
// 这些是服务器在牌桌状态改变后，广播给所有客户端的事件通知。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    // --- 牌桌管理消息 ---
    /// 成功加入或创建牌桌后，服务器私密地发给该玩家
    TableJoined {
        table_id: TableId,
        your_id: PlayerId,
        your_seat: Seat,
        view: TableView,
    },
    /// 一个新玩家坐下了
    PlayerJoined { seat: Seat, nickname: String },
    /// 一个玩家离开，座位交给电脑
    PlayerLeft { seat: Seat },

    // --- 牌局状态更新消息 ---
    /// 新的一局开始，`first` 持有开局牌
    RoundStarted { first: Seat },
    /// 某个座位出了牌
    Played { seat: Seat, combo: Combo, remaining: usize },
    /// 某个座位过牌
    Passed { seat: Seat },
    /// 连续过牌后桌面清空，`leader` 可以任意出牌
    TrickCleared { leader: Seat },
    /// 轮到下一个座位行动
    NextToAct { seat: Seat },
    /// 有人出完了手牌
    RoundOver { winner: Seat },
    /// 牌桌快照。
    /// 广播前服务器会按接收者重新生成，只包含接收者自己的手牌。
    TableSnapshot(TableView),
    /// 玩家的手牌
    YourHand { cards: Vec<Card> },

    Info { message: String },
    /// 出牌被拒绝等错误，只发给当事人
    Error { message: String },
}

impl From<Vec<Card>> for ClientMessage {
    fn from(cards: Vec<Card>) -> Self {
        ClientMessage::Play { cards }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::parse_cards;

    #[test]
    fn test_play_message_json_shape() {
        let msg = ClientMessage::from(parse_cards("3♠ 3♥").unwrap());
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.starts_with("{\"Play\""));
        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_unit_message_json_shape() {
        assert_eq!(serde_json::to_string(&ClientMessage::Pass).unwrap(), "\"Pass\"");
    }
}
