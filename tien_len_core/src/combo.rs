use crate::card::{Card, Rank};
use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 牌型 (Combo)
/// 持有牌型标签和按点数、花色排好序的成员牌。
/// 字段私有，只能通过 `detect` (或 `TryFrom<Vec<Card>>`) 得到，
/// 所以内容总是和标签一致：成员牌非空，对子一定是两张同点数的牌，顺子一定不含 2。
/// 序列化时只写出成员牌，反序列化时重新识别。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Card>", into = "Vec<Card>")]
pub struct Combo {
    kind: ComboKind,
    cards: Vec<Card>,
}

/// 不带成员牌的牌型标签，用于比较形状和给 AI 打分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComboKind {
    Single,   // 单张
    Pair,     // 对子
    Triple,   // 三张
    Straight, // 顺子 (至少 3 张)
    Bomb,     // 炸弹 (四张同点数)
}

impl Combo {
    pub fn kind(&self) -> ComboKind {
        self.kind
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// 排序后最大的那张牌
    pub fn highest(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    /// 用于比较的点数：同点数牌型取共同点数，顺子取最大一张的点数
    pub fn primary_rank(&self) -> Option<Rank> {
        self.highest().map(|c| c.rank)
    }

    /// `self` 能否压过 `prev`
    pub fn beats(&self, prev: &Combo) -> bool {
        compare(prev, self) == Ordering::Greater
    }
}

impl TryFrom<Vec<Card>> for Combo {
    type Error = RuleError;

    fn try_from(cards: Vec<Card>) -> Result<Self, Self::Error> {
        detect(&cards).ok_or(RuleError::InvalidCombo)
    }
}

impl From<Combo> for Vec<Card> {
    fn from(combo: Combo) -> Self {
        combo.cards
    }
}

// --- 牌型识别 ---

/// 把一组牌识别成牌型，不合法时返回 None。
/// 输入视为集合，顺序无关；重复的牌直接判为不合法。
pub fn detect(cards: &[Card]) -> Option<Combo> {
    let mut sorted = cards.to_vec();
    sorted.sort();
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }

    let kind = match sorted.len() {
        0 => return None,
        1 => ComboKind::Single,
        2 if same_rank(&sorted) => ComboKind::Pair,
        3 if same_rank(&sorted) => ComboKind::Triple,
        4 if same_rank(&sorted) => ComboKind::Bomb,
        _ if is_straight(&sorted) => ComboKind::Straight,
        _ => return None,
    };
    Some(Combo { kind, cards: sorted })
}

fn same_rank(cards: &[Card]) -> bool {
    cards.windows(2).all(|w| w[0].rank == w[1].rank)
}

/// 顺子：至少 3 张，不含 2，排序后点数逐一相连 (同时排除了重复点数)
fn is_straight(sorted: &[Card]) -> bool {
    sorted.len() >= 3
        && sorted.iter().all(|c| !c.rank.is_top())
        && sorted.windows(2).all(|w| w[1].rank.index() == w[0].rank.index() + 1)
}

// --- 牌型比较 ---

/// 比较桌面上的 `prev` 与新出的 `next`，返回 `next` 相对 `prev` 的大小。
/// `Greater` 表示 `next` 能压过 `prev`。
///
/// 1. `prev` 是炸弹：只有点数更大的炸弹才能压过，其他牌型一律 `Less`。
/// 2. `next` 是炸弹：压过任何非炸弹。
/// 3. 牌型或张数不同：一律 `Less`，不会得到 `Equal`。
/// 4. 比较主点数。
/// 5. 主点数相同时比较各自最大一张牌的花色。
pub fn compare(prev: &Combo, next: &Combo) -> Ordering {
    use ComboKind::Bomb;
    match (prev.kind, next.kind) {
        (Bomb, Bomb) => next.primary_rank().cmp(&prev.primary_rank()),
        (Bomb, _) => Ordering::Less,
        (_, Bomb) => Ordering::Greater,
        _ if prev.kind != next.kind || prev.len() != next.len() => Ordering::Less,
        // Option<Card> 按点数再按花色比较，正好是第 4、5 步
        _ => next.highest().cmp(&prev.highest()),
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for ComboKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            ComboKind::Single => "单张",
            ComboKind::Pair => "对子",
            ComboKind::Triple => "三张",
            ComboKind::Straight => "顺子",
            ComboKind::Bomb => "炸弹",
        })
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cards: Vec<String> = self.cards().iter().map(|c| c.to_string()).collect();
        write!(f, "{}({})", self.kind(), cards.join(" "))
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Suit, parse_cards};
    use Rank::*;
    use Suit::*;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    fn combo(text: &str) -> Combo {
        detect(&parse_cards(text).unwrap()).unwrap()
    }

    // --- 牌型识别测试 ---

    #[test]
    fn test_detect_empty_and_single() {
        assert_eq!(detect(&[]), None);
        let single = detect(&[card(Seven, Heart)]).unwrap();
        assert_eq!(single.kind(), ComboKind::Single);
        assert_eq!(single.cards(), &[card(Seven, Heart)]);
        assert_eq!(single.highest(), Some(card(Seven, Heart)));
    }

    #[test]
    fn test_detect_pair() {
        let pair = detect(&[card(Three, Heart), card(Three, Spade)]).unwrap();
        assert_eq!(pair.kind(), ComboKind::Pair);
        assert_eq!(pair.primary_rank().unwrap(), Three);
        // 成员牌已排序
        assert_eq!(pair.cards(), &[card(Three, Spade), card(Three, Heart)]);
        assert_eq!(detect(&[card(Three, Spade), card(Four, Spade)]), None);
    }

    #[test]
    fn test_detect_triple_or_short_straight() {
        let triple = combo("8♠ 8♦ 8♥");
        assert_eq!(triple.kind(), ComboKind::Triple);
        assert_eq!(triple.primary_rank().unwrap(), Eight);

        let straight = combo("5♠ 3♠ 4♠");
        assert_eq!(straight.kind(), ComboKind::Straight);
        assert_eq!(straight.primary_rank().unwrap(), Five);

        assert_eq!(detect(&parse_cards("3♠ 4♠ 6♠").unwrap()), None);
        assert_eq!(detect(&parse_cards("3♠ 3♥ 4♠").unwrap()), None);
    }

    #[test]
    fn test_straight_never_contains_two() {
        assert_eq!(detect(&parse_cards("2♠ 3♥ 4♣").unwrap()), None);
        assert_eq!(detect(&parse_cards("K♠ A♥ 2♣").unwrap()), None);
        assert_eq!(combo("Q♠ K♥ A♣").primary_rank().unwrap(), Ace);
    }

    #[test]
    fn test_detect_bomb_or_four_straight() {
        let bomb = detect(&[card(Nine, Spade), card(Nine, Heart), card(Nine, Diamond), card(Nine, Club)]).unwrap();
        assert_eq!(bomb.kind(), ComboKind::Bomb);
        assert_eq!(bomb.primary_rank().unwrap(), Nine);

        let straight = combo("10♠ J♥ Q♣ K♦");
        assert_eq!(straight.kind(), ComboKind::Straight);
        assert_eq!(straight.len(), 4);
        assert_eq!(detect(&parse_cards("9♠ 9♥ 9♦ 10♣").unwrap()), None);
    }

    #[test]
    fn test_detect_long_straights() {
        let run = combo("3♠ 4♥ 5♣ 6♦ 7♠ 8♠ 9♥ 10♣ J♦ Q♠ K♠ A♥");
        assert_eq!(run.kind(), ComboKind::Straight);
        assert_eq!(run.len(), 12);
        assert_eq!(run.primary_rank().unwrap(), Ace);
        assert_eq!(detect(&parse_cards("3♠ 4♥ 5♣ 6♦ 8♠").unwrap()), None);
        assert_eq!(detect(&parse_cards("3♠ 4♥ 5♣ 5♦ 6♠").unwrap()), None);
    }

    #[test]
    fn test_detect_rejects_duplicates() {
        assert_eq!(detect(&[card(Three, Spade), card(Three, Spade)]), None);
    }

    #[test]
    fn test_mismatched_shape_cannot_be_built() {
        assert_eq!(Combo::try_from(vec![card(Three, Spade), card(Nine, Heart)]), Err(RuleError::InvalidCombo));
        assert_eq!(Combo::try_from(Vec::<Card>::new()), Err(RuleError::InvalidCombo));
        assert_eq!(Combo::try_from(parse_cards("2♠ 3♥ 4♣").unwrap()), Err(RuleError::InvalidCombo));

        // 反序列化同样要重新识别
        assert!(serde_json::from_str::<Combo>("[]").is_err());

        let pair = Combo::try_from(vec![card(Nine, Heart), card(Nine, Spade)]).unwrap();
        assert_eq!(pair.kind(), ComboKind::Pair);
        assert_eq!(pair.highest(), Some(card(Nine, Heart)));
    }

    // --- 牌型比较测试 ---

    #[test]
    fn test_pair_suit_tie_break() {
        let low = combo("5♠ 5♣");
        let high = combo("5♦ 5♥");
        assert_eq!(compare(&low, &high), Ordering::Greater);
        assert_eq!(compare(&high, &low), Ordering::Less);
        assert!(high.beats(&low));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let bomb = combo("3♠ 3♣ 3♦ 3♥");
        let pair = combo("2♠ 2♥");
        assert_eq!(compare(&bomb, &pair), Ordering::Less);

        let three_run = combo("3♠ 4♠ 5♠");
        let five_run = combo("3♥ 4♥ 5♥ 6♥ 7♥");
        assert_eq!(compare(&five_run, &three_run), Ordering::Less);
        assert_eq!(compare(&three_run, &five_run), Ordering::Less);

        assert_eq!(compare(&combo("9♠"), &combo("9♣ 9♥")), Ordering::Less);
    }

    #[test]
    fn test_bombs() {
        let bomb7 = combo("7♠ 7♣ 7♦ 7♥");
        let bomb9 = combo("9♠ 9♣ 9♦ 9♥");
        assert_eq!(compare(&bomb7, &bomb9), Ordering::Greater);
        assert_eq!(compare(&bomb9, &bomb7), Ordering::Less);
        // 同点数的炸弹压不过
        assert_ne!(compare(&bomb7, &bomb7), Ordering::Greater);
        assert!(!bomb7.beats(&bomb7));
        assert!(bomb9.beats(&bomb7));

        let long_run = combo("3♥ 4♥ 5♥ 6♥ 7♥ 8♥ 9♥ 10♥");
        assert_eq!(compare(&long_run, &bomb9), Ordering::Greater);
        assert_eq!(compare(&combo("2♥"), &bomb7), Ordering::Greater);
        assert_eq!(compare(&bomb7, &combo("2♥")), Ordering::Less);
    }

    #[test]
    fn test_rank_then_suit() {
        assert_eq!(compare(&combo("K♥"), &combo("A♠")), Ordering::Greater);
        assert_eq!(compare(&combo("A♠"), &combo("2♠")), Ordering::Greater);
        assert_eq!(compare(&combo("7♦"), &combo("7♥")), Ordering::Greater);
        assert_eq!(compare(&combo("7♥"), &combo("7♥")), Ordering::Equal);
        // 顺子最大牌点数相同，比最大牌的花色
        assert_eq!(compare(&combo("5♥ 6♥ 7♦"), &combo("5♠ 6♠ 7♥")), Ordering::Greater);
        assert_eq!(compare(&combo("5♠ 6♠ 7♠"), &combo("6♥ 7♥ 8♥")), Ordering::Greater);
    }

    #[test]
    fn test_serde_redetects_shape() {
        let straight = combo("3♠ 4♠ 5♥");
        let json = serde_json::to_string(&straight).unwrap();
        let back: Combo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, straight);

        let bogus = serde_json::to_string(&parse_cards("3♠ 5♠").unwrap()).unwrap();
        assert!(serde_json::from_str::<Combo>(&bogus).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(combo("5♥ 5♠").to_string(), "对子(5♠ 5♥)");
    }
}
