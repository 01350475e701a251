use crate::card::*;
use crate::combo::{Combo, detect};
use crate::error::RuleError;
use crate::state::*;
use rand::Rng;
use tracing::debug;

// --- 核心游戏流程函数 ---

/// 用默认配置 (持有 3♠ 的玩家先出) 开始新的一局
pub fn init_game<R: Rng + ?Sized>(player_count: usize, rng: &mut R) -> Result<TableState, RuleError> {
    let config = TableConfig { players: player_count, ..TableConfig::default() };
    init_game_with(&config, rng)
}

/// 开始新的一局游戏
///
/// - 创建一副新牌并用调用方提供的随机源洗牌。
/// - 轮流发给所有座位，每手牌排好序。
/// - 持有开局牌 (指定花色的 3) 的座位先出牌。
/// - 桌面清空，连续过牌数归零。
pub fn init_game_with<R: Rng + ?Sized>(config: &TableConfig, rng: &mut R) -> Result<TableState, RuleError> {
    let deck = shuffle(&build_deck(), rng);
    let hands = deal(&deck, config.players)?;

    let opening_card = Card::new(Rank::Three, config.opening_suit);
    let first = hands.iter().position(|h| h.contains(&opening_card)).unwrap_or(0);
    debug!(players = config.players, first, "发牌完成，{} 先出", opening_card);

    Ok(TableState {
        players: config.players,
        hands,
        current_player: first,
        last_combo: None,
        last_player: None,
        passes_in_row: 0,
        started: true,
        finished: false,
        winner: None,
    })
}

/// 检查 `seat` 打出 `cards` 是否合法，合法时返回识别出的牌型。
///
/// 依次检查：牌局已结束、未开始、没轮到该座位、牌不在手中、牌型不合法，
/// 最后在桌面有牌时检查能否压过。
pub fn check_legal_move(state: &TableState, seat: Seat, cards: &[Card]) -> Result<Combo, RuleError> {
    if state.finished {
        return Err(RuleError::GameFinished);
    }
    if !state.started {
        return Err(RuleError::NotStarted);
    }
    if seat != state.current_player {
        return Err(RuleError::NotYourTurn);
    }

    let hand = state.hand(seat);
    if let Some(missing) = cards.iter().find(|c| !hand.contains(c)) {
        return Err(RuleError::CardNotInHand(*missing));
    }

    let combo = detect(cards).ok_or(RuleError::InvalidCombo)?;
    match &state.last_combo {
        Some(last) if !combo.beats(last) => Err(RuleError::DoesNotBeatLastCombo),
        _ => Ok(combo),
    }
}

/// 应用一次已经校验过的出牌，返回新的状态，原状态不变
pub fn apply_move(state: &TableState, seat: Seat, combo: &Combo) -> TableState {
    let mut next = state.clone();
    commit_move(&mut next, seat, combo);
    next
}

/// 应用一次过牌，返回新的状态，原状态不变
pub fn apply_pass(state: &TableState, seat: Seat) -> TableState {
    let mut next = state.clone();
    commit_pass(&mut next, seat);
    next
}

/// 校验并就地执行出牌。被拒绝时状态不变。
pub fn play(state: &mut TableState, seat: Seat, cards: &[Card]) -> Result<Combo, RuleError> {
    let combo = check_legal_move(state, seat, cards)?;
    commit_move(state, seat, &combo);
    Ok(combo)
}

/// 校验并就地执行过牌，返回这次过牌是否清空了桌面。
/// 即使手里有能压过的牌也允许过牌。
pub fn pass(state: &mut TableState, seat: Seat) -> Result<bool, RuleError> {
    if state.finished {
        return Err(RuleError::GameFinished);
    }
    if !state.started {
        return Err(RuleError::NotStarted);
    }
    if seat != state.current_player {
        return Err(RuleError::NotYourTurn);
    }
    let had_combo = !state.is_table_clear();
    commit_pass(state, seat);
    Ok(had_combo && state.is_table_clear())
}

// --- 辅助逻辑函数 ---

fn commit_move(state: &mut TableState, seat: Seat, combo: &Combo) {
    if state.finished || seat >= state.players {
        return;
    }

    let hand = &mut state.hands[seat];
    hand.retain(|c| !combo.cards().contains(c));
    let emptied = hand.is_empty();
    debug!(seat, remaining = hand.len(), "出牌 {}", combo);

    state.last_combo = Some(combo.clone());
    state.last_player = Some(seat);
    state.passes_in_row = 0;
    if emptied {
        state.finished = true;
        state.winner = Some(seat);
        debug!(seat, "手牌出完，牌局结束");
    }
    advance_turn(state, seat);
}

fn commit_pass(state: &mut TableState, seat: Seat) {
    if state.finished || seat >= state.players {
        return;
    }

    state.passes_in_row += 1;
    debug!(seat, passes = state.passes_in_row, "过牌");
    // 除了最后出牌的人，其他人都过了：清空桌面
    if state.passes_in_row >= state.players.saturating_sub(1) {
        state.last_combo = None;
        state.passes_in_row = 0;
        debug!("所有人都过牌，桌面清空");
    }
    advance_turn(state, seat);
}

fn advance_turn(state: &mut TableState, seat: Seat) {
    state.current_player = (seat + 1) % state.players;
}

// --- 单元测试 ---
