//! # 越南扑克 (Tiến Lên) 核心逻辑库
//!
//! 这个 `core` crate 包含了牌型识别、牌型比较、牌桌状态流转、
//! 电脑玩家出牌策略，以及客户端-服务器通信消息的定义。
//! 它的设计目标是与具体实现（如网络服务器、客户端UI）解耦，
//! 使其可以被任何上层应用复用。
//!
//! 所有操作都是同步的、单线程的；同一张牌桌上的操作需要调用方串行化。

mod ai;
mod card;
mod combo;
mod error;
mod logic;
mod message;
mod state;
mod table;

pub use ai::*;

pub use card::*;

pub use combo::*;

pub use error::*;

pub use logic::*;

pub use message::*;

pub use state::*;

pub use table::*;
