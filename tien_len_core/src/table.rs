use crate::ai::choose_move;
use crate::card::{Card, DECK_SIZE};
use crate::error::RuleError;
use crate::logic::{init_game_with, pass, play};
use crate::message::ServerMessage;
use crate::state::*;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 座位上坐的是谁
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupant {
    Bot,
    Human { id: PlayerId, nickname: String },
}

/// 一张牌桌：牌局状态、随机源和座位表。
/// 同一张牌桌的所有操作必须串行执行，由持有者负责加锁。
#[derive(Debug)]
pub struct Table {
    pub id: TableId,
    pub config: TableConfig,
    seats: Vec<Occupant>,
    state: TableState,
    rng: StdRng,
}

impl Table {
    pub fn new(id: TableId, config: TableConfig, rng: StdRng) -> Result<Self, RuleError> {
        if config.players == 0 || config.players > DECK_SIZE {
            return Err(RuleError::InvalidConfiguration(format!("座位数不合法: {}", config.players)));
        }
        Ok(Table {
            id,
            config,
            seats: vec![Occupant::Bot; config.players],
            state: TableState::new(config.players),
            rng,
        })
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn seats(&self) -> &[Occupant] {
        &self.seats
    }

    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        self.seats.iter().position(|o| matches!(o, Occupant::Human { id, .. } if *id == player))
    }

    pub fn nickname_of(&self, player: PlayerId) -> Option<&str> {
        self.seats.iter().find_map(|o| match o {
            Occupant::Human { id, nickname } if *id == player => Some(nickname.as_str()),
            _ => None,
        })
    }

    pub fn view_for(&self, player: PlayerId) -> TableView {
        self.state.view_for(self.seat_of(player))
    }

    /// 把一条事件改写成发给 `player` 的版本。
    /// 事件里的牌桌快照是旁观视角，这里换成该玩家自己的视图，其他事件原样返回。
    pub fn personalize(&self, msg: &ServerMessage, player: PlayerId) -> ServerMessage {
        match msg {
            ServerMessage::TableSnapshot(_) => ServerMessage::TableSnapshot(self.view_for(player)),
            other => other.clone(),
        }
    }

    pub fn hand_of(&self, player: PlayerId) -> Option<Vec<Card>> {
        self.seat_of(player).map(|seat| self.state.hand(seat).to_vec())
    }

    // --- 座位管理 ---

    /// 坐到第一个电脑座位上
    pub fn join(&mut self, nickname: String) -> Result<(PlayerId, Seat), RuleError> {
        let seat = self
            .seats
            .iter()
            .position(|o| *o == Occupant::Bot)
            .ok_or_else(|| RuleError::InvalidConfiguration("牌桌已满".to_string()))?;
        let id = Uuid::new_v4();
        info!("玩家 {} ({}) 坐到了牌桌 {} 的 {} 号座位", nickname, id, self.id, seat);
        self.seats[seat] = Occupant::Human { id, nickname };
        Ok((id, seat))
    }

    /// 玩家离开，座位交还给电脑。如果正轮到该座位，电脑会接着出牌。
    pub fn leave(&mut self, player: PlayerId) -> Vec<ServerMessage> {
        let Some(seat) = self.seat_of(player) else {
            return vec![];
        };
        info!("玩家 {} 离开了牌桌 {} 的 {} 号座位", player, self.id, seat);
        self.seats[seat] = Occupant::Bot;

        let mut events = vec![ServerMessage::PlayerLeft { seat }];
        if self.state.phase() == GamePhase::InProgress && self.state.current_player == seat {
            self.drive_bots(&mut events);
        }
        events
    }

    // --- 牌局流程 ---

    /// 重新洗牌发牌开始新的一局，然后让电脑玩家行动到轮到真人为止
    pub fn start_round(&mut self) -> Result<Vec<ServerMessage>, RuleError> {
        if self.state.phase() == GamePhase::InProgress {
            return Err(RuleError::InvalidConfiguration("本局尚未结束".to_string()));
        }
        self.state = init_game_with(&self.config, &mut self.rng)?;
        info!("牌桌 {} 开始新的一局，{} 号座位先出", self.id, self.state.current_player);

        let mut events = vec![ServerMessage::RoundStarted { first: self.state.current_player }];
        self.drive_bots(&mut events);
        Ok(events)
    }

    pub fn play(&mut self, player: PlayerId, cards: &[Card]) -> Result<Vec<ServerMessage>, RuleError> {
        let seat = self.seat_of(player).ok_or(RuleError::NotYourTurn)?;
        let combo = play(&mut self.state, seat, cards)?;

        let mut events = vec![ServerMessage::Played { seat, combo, remaining: self.state.hand(seat).len() }];
        self.drive_bots(&mut events);
        Ok(events)
    }

    pub fn pass(&mut self, player: PlayerId) -> Result<Vec<ServerMessage>, RuleError> {
        let seat = self.seat_of(player).ok_or(RuleError::NotYourTurn)?;
        let cleared = pass(&mut self.state, seat)?;

        let mut events = vec![ServerMessage::Passed { seat }];
        if cleared {
            events.push(ServerMessage::TrickCleared { leader: self.state.current_player });
        }
        self.drive_bots(&mut events);
        Ok(events)
    }

    /// 电脑座位连续行动，直到轮到真人或牌局结束。
    /// 最后追加 NextToAct 或 RoundOver，以及一份牌桌快照。
    fn drive_bots(&mut self, events: &mut Vec<ServerMessage>) {
        while !self.state.finished && self.seats[self.state.current_player] == Occupant::Bot {
            let seat = self.state.current_player;
            match choose_move(&self.state, seat) {
                Some(cards) => match play(&mut self.state, seat, &cards) {
                    Ok(combo) => {
                        debug!(seat, "电脑出牌 {}", combo);
                        let remaining = self.state.hand(seat).len();
                        events.push(ServerMessage::Played { seat, combo, remaining });
                    }
                    Err(e) => {
                        warn!(seat, "电脑出牌被拒绝: {}", e);
                        break;
                    }
                },
                None => match pass(&mut self.state, seat) {
                    Ok(cleared) => {
                        events.push(ServerMessage::Passed { seat });
                        if cleared {
                            events.push(ServerMessage::TrickCleared { leader: self.state.current_player });
                        }
                    }
                    Err(e) => {
                        warn!(seat, "电脑过牌被拒绝: {}", e);
                        break;
                    }
                },
            }
        }

        match self.state.winner {
            Some(winner) if self.state.finished => {
                info!("牌桌 {} 本局结束，{} 号座位获胜", self.id, winner);
                events.push(ServerMessage::RoundOver { winner });
            }
            _ => events.push(ServerMessage::NextToAct { seat: self.state.current_player }),
        }
        events.push(ServerMessage::TableSnapshot(self.state.view_for(None)));
    }
}

// --- 单元测试 ---
