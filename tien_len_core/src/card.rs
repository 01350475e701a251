use crate::error::RuleError;
use rand::Rng;
use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- 核心数据结构定义 ---

/// 一副牌的张数
pub const DECK_SIZE: usize = 52;

/// 花色 (Suit)
/// 花色只用于同点数时的比较：♠ < ♣ < ♦ < ♥
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Spade,   // 黑桃 ♠
    Club,    // 梅花 ♣
    Diamond, // 方块 ♦
    Heart,   // 红心 ♥
}

/// 点数 (Rank)
/// 3 最小，2 最大。Ord 的派生顺序就是游戏中的大小顺序。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Rank {
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Two,
}

/// 单张牌 (Card)
/// 字段顺序决定了派生的 Ord：先比点数，再比花色。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Club, Suit::Diamond, Suit::Heart];

    fn glyph(self) -> char {
        match self {
            Suit::Spade => '♠',
            Suit::Club => '♣',
            Suit::Diamond => '♦',
            Suit::Heart => '♥',
        }
    }

    fn from_char(c: char) -> Option<Suit> {
        match c {
            '♠' | 's' | 'S' => Some(Suit::Spade),
            '♣' | 'c' | 'C' => Some(Suit::Club),
            '♦' | 'd' | 'D' => Some(Suit::Diamond),
            '♥' | 'h' | 'H' => Some(Suit::Heart),
            _ => None,
        }
    }
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven, Rank::Eight, Rank::Nine,
        Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace, Rank::Two,
    ];

    /// 在点数表中的位置，3 为 0，2 为 12
    pub fn index(self) -> usize {
        self as usize
    }

    /// 最大的点数 (2) 不能出现在顺子里
    pub fn is_top(self) -> bool {
        self == Rank::Two
    }

    fn token(self) -> &'static str {
        match self {
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::Two => "2",
        }
    }

    fn from_token(token: &str) -> Option<Rank> {
        match token.to_ascii_uppercase().as_str() {
            "T" => Some(Rank::Ten),
            upper => Rank::ALL.into_iter().find(|r| r.token() == upper),
        }
    }
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    /// 解析 "10♥"、"3♣" 这样的文本。无法识别时返回 None。
    pub fn parse(text: &str) -> Option<Card> {
        let text = text.trim().trim_end_matches('\u{FE0F}');
        let suit_char = text.chars().last()?;
        let suit = Suit::from_char(suit_char)?;
        let rank = Rank::from_token(&text[..text.len() - suit_char.len_utf8()])?;
        Some(Card { rank, suit })
    }
}

/// 解析一串以空白或逗号分隔的牌，任何一张无法识别时返回 None
pub fn parse_cards(text: &str) -> Option<Vec<Card>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(Card::parse)
        .collect()
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Card::parse(s).ok_or_else(|| RuleError::InvalidConfiguration(format!("无法识别的牌: {s}")))
    }
}

// --- 牌组 ---

/// 创建一副完整的 52 张牌，按花色分组、组内点数从小到大
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for &suit in &Suit::ALL {
        for &rank in &Rank::ALL {
            deck.push(Card { rank, suit });
        }
    }
    deck
}

/// 返回洗好的新牌组，不修改输入。
/// 随机源由调用者传入，测试时可以用固定种子复现结果。
pub fn shuffle<R: Rng + ?Sized>(cards: &[Card], rng: &mut R) -> Vec<Card> {
    let mut shuffled = cards.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// 轮流发牌：第 i 张牌发给座位 i % player_count，每手牌再按点数、花色排序
pub fn deal(deck: &[Card], player_count: usize) -> Result<Vec<Vec<Card>>, RuleError> {
    if player_count == 0 || player_count > deck.len() {
        return Err(RuleError::InvalidConfiguration(format!(
            "玩家人数必须在 1 到 {} 之间，实际为 {player_count}",
            deck.len()
        )));
    }

    let mut hands = vec![Vec::with_capacity(deck.len() / player_count + 1); player_count];
    for (i, card) in deck.iter().enumerate() {
        hands[i % player_count].push(*card);
    }
    for hand in &mut hands {
        hand.sort();
    }
    Ok(hands)
}

// --- 单元测试 ---
