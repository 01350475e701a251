use crate::card::{Card, Suit};
use crate::combo::Combo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TableId = Uuid;
pub type PlayerId = Uuid;

/// 座位号，范围 0..players
pub type Seat = usize;

/// 开一桌牌需要的配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub players: usize,
    // 持有该花色 3 的玩家先出牌
    pub opening_suit: Suit,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig { players: 4, opening_suit: Suit::Spade }
    }
}

/// 一桌牌局的完整状态。
/// 只能通过 `logic` 中的出牌、过牌两种操作改变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    pub players: usize,
    // 每个座位的手牌，始终按点数、花色排序
    pub hands: Vec<Vec<Card>>,
    pub current_player: Seat,
    // 当前需要被压过的牌型，None 表示桌面已清空，可以任意出牌
    pub last_combo: Option<Combo>,
    // 打出 last_combo 的座位
    pub last_player: Option<Seat>,
    // last_combo 之后连续过牌的次数
    pub passes_in_row: usize,
    pub started: bool,
    pub finished: bool,
    pub winner: Option<Seat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    NotStarted,
    InProgress,
    Finished,
}

/// 发给某个座位的牌桌视图：只看得到自己的手牌，其他人只有张数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub players: usize,
    pub your_seat: Option<Seat>,
    pub your_hand: Vec<Card>,
    pub hand_sizes: Vec<usize>,
    pub current_player: Seat,
    pub last_combo: Option<Combo>,
    pub last_player: Option<Seat>,
    pub passes_in_row: usize,
    pub phase: GamePhase,
    pub winner: Option<Seat>,
}

// --- TableState 的实现方法 ---

impl TableState {
    /// 尚未发牌的空牌桌
    pub fn new(players: usize) -> Self {
        TableState {
            players,
            hands: vec![Vec::new(); players],
            current_player: 0,
            last_combo: None,
            last_player: None,
            passes_in_row: 0,
            started: false,
            finished: false,
            winner: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        if self.finished {
            GamePhase::Finished
        } else if self.started {
            GamePhase::InProgress
        } else {
            GamePhase::NotStarted
        }
    }

    pub fn hand(&self, seat: Seat) -> &[Card] {
        self.hands.get(seat).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 所有人手里剩余的牌数
    pub fn total_cards(&self) -> usize {
        self.hands.iter().map(Vec::len).sum()
    }

    /// 桌面是否已清空 (可以任意出牌)
    pub fn is_table_clear(&self) -> bool {
        self.last_combo.is_none()
    }

    pub fn view_for(&self, seat: Option<Seat>) -> TableView {
        let your_hand = seat.map(|s| self.hand(s).to_vec()).unwrap_or_default();
        TableView {
            players: self.players,
            your_seat: seat,
            your_hand,
            hand_sizes: self.hands.iter().map(Vec::len).collect(),
            current_player: self.current_player,
            last_combo: self.last_combo.clone(),
            last_player: self.last_player,
            passes_in_row: self.passes_in_row,
            phase: self.phase(),
            winner: self.winner,
        }
    }
}
