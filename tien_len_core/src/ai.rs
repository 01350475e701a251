//! 电脑玩家的出牌策略。
//!
//! 这是一个贪心的单步启发式：列出当前所有合法出法，逐个打分，取最高分。
//! 它只看眼前这一手，不会推演之后的几轮。

use crate::card::{Card, Rank};
use crate::combo::{Combo, ComboKind, compare};
use crate::logic::check_legal_move;
use crate::state::{Seat, TableState};

/// 枚举顺子时的最大长度
pub const MAX_STRAIGHT_LEN: usize = 10;

// 打分低于这个值的候选直接排除
const EXCLUDED: i32 = -1000;

/// 打分权重
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicWeights {
    // === 开局 (桌面为空) ===
    pub single_bonus: i32,
    pub mid_rank_bonus: i32,
    pub mid_rank_low: usize,
    pub mid_rank_high: usize,
    pub break_pair_penalty: i32,
    pub pair_bonus: i32,
    pub triple_bonus: i32,
    pub bomb_bonus: i32,
    pub structure_bonus: i32,

    // === 跟牌 (桌面有牌) ===
    pub beat_weight: i32,
    pub same_shape_bonus: i32,
    pub bomb_penalty: i32,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            single_bonus: 10,
            mid_rank_bonus: 5,
            mid_rank_low: 4,
            mid_rank_high: 9,
            break_pair_penalty: 3,
            pair_bonus: 5,
            triple_bonus: 3,
            bomb_bonus: 1,
            structure_bonus: 2,

            beat_weight: 10,
            same_shape_bonus: 5,
            bomb_penalty: 20,
        }
    }
}

/// 用默认权重为 `seat` 选一手牌，None 表示只能过牌
pub fn choose_move(state: &TableState, seat: Seat) -> Option<Vec<Card>> {
    choose_move_with(state, seat, &HeuristicWeights::default())
}

pub fn choose_move_with(state: &TableState, seat: Seat, weights: &HeuristicWeights) -> Option<Vec<Card>> {
    let hand = state.hand(seat);
    let mut best: Option<(i32, Combo)> = None;

    for combo in legal_moves(state, seat) {
        let score = match &state.last_combo {
            None => opening_score(&combo, hand, weights),
            Some(last) => following_score(&combo, last, weights),
        };
        if score <= EXCLUDED {
            continue;
        }
        // 分数相同时保留先枚举到的候选
        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            best = Some((score, combo));
        }
    }

    best.map(|(_, combo)| combo.cards().to_vec())
}

/// `seat` 当前所有合法出法，按枚举顺序排列
pub fn legal_moves(state: &TableState, seat: Seat) -> Vec<Combo> {
    candidate_moves(state.hand(seat))
        .iter()
        .filter_map(|cards| check_legal_move(state, seat, cards).ok())
        .collect()
}

/// 从手牌中枚举候选出法：
/// - 每一张单牌；
/// - 每个点数取最前面的 2/3/4 张组成对子、三张、炸弹 (不枚举所有花色组合)；
/// - 长度 3 到 `MAX_STRAIGHT_LEN` 的每个顺子，每个点数取最前面的一张。
pub fn candidate_moves(hand: &[Card]) -> Vec<Vec<Card>> {
    let by_rank = group_by_rank(hand);
    let mut candidates: Vec<Vec<Card>> = hand.iter().map(|c| vec![*c]).collect();

    for cards in &by_rank {
        for size in 2..=cards.len().min(4) {
            candidates.push(cards[..size].to_vec());
        }
    }

    // 顺子不能包含 2
    let straight_ranks = Rank::Two.index();
    for len in 3..=MAX_STRAIGHT_LEN {
        for start in 0..=straight_ranks.saturating_sub(len) {
            let run = &by_rank[start..start + len];
            if run.iter().all(|cards| !cards.is_empty()) {
                candidates.push(run.iter().map(|cards| cards[0]).collect());
            }
        }
    }

    candidates
}

fn group_by_rank(hand: &[Card]) -> Vec<Vec<Card>> {
    let mut sorted = hand.to_vec();
    sorted.sort();
    let mut groups = vec![Vec::new(); Rank::ALL.len()];
    for card in sorted {
        groups[card.rank.index()].push(card);
    }
    groups
}

// --- 打分 ---

/// 桌面为空时的打分：偏好中间点数的单张，多张牌型里偏好小的，尽量留住炸弹
fn opening_score(combo: &Combo, hand: &[Card], w: &HeuristicWeights) -> i32 {
    match combo.kind() {
        ComboKind::Single => {
            let Some(card) = combo.highest() else {
                return EXCLUDED;
            };
            let mut score = w.single_bonus;
            if (w.mid_rank_low..=w.mid_rank_high).contains(&card.rank.index()) {
                score += w.mid_rank_bonus;
            }
            // 拆散对子会让另一张落单
            if hand.iter().filter(|c| c.rank == card.rank).count() == 2 {
                score -= w.break_pair_penalty;
            }
            score
        }
        ComboKind::Pair => w.pair_bonus + w.structure_bonus,
        ComboKind::Triple => w.triple_bonus + w.structure_bonus,
        ComboKind::Bomb => w.bomb_bonus,
        ComboKind::Straight => 0,
    }
}

/// 桌面有牌时的打分：压不过的排除，同牌型同张数的最小压制加分，炸弹扣分
fn following_score(combo: &Combo, last: &Combo, w: &HeuristicWeights) -> i32 {
    if !combo.beats(last) {
        return EXCLUDED;
    }
    let mut score = w.beat_weight * compare(last, combo) as i32;
    if combo.kind() == last.kind() && combo.len() == last.len() {
        score += w.same_shape_bonus;
    }
    if combo.kind() == ComboKind::Bomb {
        score -= w.bomb_penalty;
    }
    score
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Suit, parse_cards};
    use crate::combo::detect;
    use crate::error::RuleError;
    use crate::logic::{init_game, pass, play};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn cards(text: &str) -> Vec<Card> {
        let mut parsed = parse_cards(text).unwrap();
        parsed.sort();
        parsed
    }

    // 辅助函数：座位 0 行动，手牌固定
    fn setup_test_table(hands: &[&str], last: Option<&str>) -> TableState {
        let mut state = TableState::new(hands.len());
        state.hands = hands.iter().map(|h| cards(h)).collect();
        state.started = true;
        state.last_combo = last.map(|l| detect(&cards(l)).unwrap());
        state.last_player = last.map(|_| hands.len() - 1);
        state
    }

    #[test]
    fn test_candidates_first_available_cards() {
        let hand = cards("5♠ 5♣ 5♦ 6♥ 7♠");
        let candidates = candidate_moves(&hand);

        assert_eq!(&candidates[..5], &hand.iter().map(|c| vec![*c]).collect::<Vec<_>>()[..]);
        assert!(candidates.contains(&cards("5♠ 5♣")));
        assert!(candidates.contains(&cards("5♠ 5♣ 5♦")));
        assert!(!candidates.contains(&cards("5♣ 5♦")), "只取每个点数最前面的牌");
        assert!(candidates.contains(&cards("5♠ 6♥ 7♠")));
        assert_eq!(candidates.len(), 5 + 2 + 1);
    }

    #[test]
    fn test_candidates_straights_skip_two_and_cap_length() {
        let hand = cards("3♠ 4♠ 5♠ 6♠ 7♠ 8♠ 9♠ 10♠ J♠ Q♠ K♠ A♠ 2♠");
        let candidates = candidate_moves(&hand);
        let straights: Vec<_> = candidates.iter().filter(|c| c.len() >= 3).collect();

        assert!(straights.iter().all(|s| s.len() <= MAX_STRAIGHT_LEN));
        assert!(straights.iter().all(|s| s.iter().all(|c| c.rank != Rank::Two)));
        assert!(straights.contains(&&cards("Q♠ K♠ A♠")));
        // 长度 3..=10，每种长度的起点数为 12 - len + 1
        let expected: usize = (3..=MAX_STRAIGHT_LEN).map(|len| 12 - len + 1).sum();
        assert_eq!(straights.len(), expected);
    }

    #[test]
    fn test_opening_prefers_mid_rank_single() {
        let state = setup_test_table(&["3♠ 8♣ K♥", "4♠"], None);
        assert_eq!(choose_move(&state, 0), Some(cards("8♣")));
    }

    #[test]
    fn test_opening_avoids_breaking_pairs() {
        let state = setup_test_table(&["3♠ 7♣ 7♦ 9♥", "4♠"], None);
        assert_eq!(choose_move(&state, 0), Some(cards("9♥")));

        // 只有低点数单张时，拆对子扣分，先出不拆对子的那张
        let state = setup_test_table(&["3♠ 3♣ 4♦", "4♠"], None);
        assert_eq!(choose_move(&state, 0), Some(cards("4♦")));
    }

    #[test]
    fn test_opening_ties_keep_enumeration_order() {
        let state = setup_test_table(&["3♠ K♦ A♥", "4♠"], None);
        assert_eq!(choose_move(&state, 0), Some(cards("3♠")));
    }

    #[test]
    fn test_following_minimal_same_shape() {
        let state = setup_test_table(&["4♣ 6♦ 9♥ J♠ J♣ J♦ J♥", "4♠"], Some("5♠"));
        assert_eq!(choose_move(&state, 0), Some(cards("6♦")));
    }

    #[test]
    fn test_following_pair() {
        let state = setup_test_table(&["4♣ 4♥ 8♠ 8♥ 9♦", "4♠"], Some("6♠ 6♦"));
        assert_eq!(choose_move(&state, 0), Some(cards("8♠ 8♥")));
    }

    #[test]
    fn test_following_bomb_when_forced() {
        let state = setup_test_table(&["3♠ 7♠ 7♣ 7♦ 7♥", "4♠"], Some("2♥"));
        assert_eq!(choose_move(&state, 0), Some(cards("7♠ 7♣ 7♦ 7♥")));
    }

    #[test]
    fn test_following_no_move() {
        let state = setup_test_table(&["3♠ 4♣ 9♥", "4♠"], Some("2♥"));
        assert_eq!(choose_move(&state, 0), None);
        assert!(legal_moves(&state, 0).is_empty());
    }

    #[test]
    fn test_not_your_turn_returns_none() {
        let state = setup_test_table(&["3♠", "4♠"], None);
        assert_eq!(choose_move(&state, 1), None);
    }

    #[test]
    fn test_custom_weights() {
        let weights = HeuristicWeights { mid_rank_bonus: 0, ..HeuristicWeights::default() };
        let state = setup_test_table(&["3♠ 8♣ K♥", "4♠"], None);
        assert_eq!(choose_move_with(&state, 0, &weights), Some(cards("3♠")));
    }

    #[test]
    fn test_self_play_moves_are_always_legal() {
        for seed in 0..30 {
            let mut state = init_game(4, &mut StdRng::seed_from_u64(seed)).unwrap();
            let mut turns = 0;

            while !state.finished {
                turns += 1;
                assert!(turns < 10_000, "牌局应当在有限步内结束");
                let seat = state.current_player;
                let before = state.total_cards();

                match choose_move(&state, seat) {
                    Some(chosen) => {
                        let combo = check_legal_move(&state, seat, &chosen).unwrap();
                        play(&mut state, seat, &chosen).unwrap();
                        assert_eq!(state.total_cards(), before - combo.len());
                    }
                    None => {
                        assert!(state.last_combo.is_some(), "桌面为空时总能出牌");
                        pass(&mut state, seat).unwrap();
                        assert_eq!(state.total_cards(), before);
                    }
                }
            }

            let winner = state.winner.unwrap();
            assert!(state.hands[winner].is_empty());
            assert_eq!(pass(&mut state, winner), Err(RuleError::GameFinished));
        }
    }

    #[test]
    fn test_opening_card_suit_does_not_matter_for_ai() {
        let hand = vec![Card::new(Rank::Three, Suit::Heart)];
        let mut state = TableState::new(2);
        state.hands = vec![hand.clone(), vec![Card::new(Rank::Four, Suit::Spade)]];
        state.started = true;
        assert_eq!(choose_move(&state, 0), Some(hand));
    }
}
