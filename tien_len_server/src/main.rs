mod config;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, stream::StreamExt};
use parking_lot::{Mutex as P_Mutex, RwLock as P_RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{RwLock, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tien_len_core::{ClientMessage, PlayerId, ServerMessage, Table, TableConfig, TableId};

use crate::config::ServerConfig;

// 服务器全局状态
struct AppState {
    tables: DashMap<TableId, Arc<Room>>,
    seed: Option<u64>,
    tables_created: AtomicU64,
}

// 单张牌桌的状态
// 重要‼️：严格规定使用锁的顺序，避免死锁：
// players -> host_id -> table
struct Room {
    table: P_Mutex<Table>,
    host_id: P_RwLock<PlayerId>,
    // 将 PlayerId 映射到具体的网络连接
    players: RwLock<HashMap<PlayerId, PlayerConnection>>,
}

// 玩家的网络连接信息
struct PlayerConnection {
    // 用于向该玩家的 WebSocket 任务发送消息的通道
    sender: mpsc::Sender<ServerMessage>,
}

type SharedState = Arc<AppState>;

impl AppState {
    // 每张牌桌一个独立的随机源
    fn next_rng(&self) -> StdRng {
        let n = self.tables_created.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_os_rng(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let state = SharedState::new(AppState {
        tables: DashMap::new(),
        seed: config.seed,
        tables_created: AtomicU64::new(0),
    });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state);

    let addr = config.addr();
    info!("服务器正在监听 {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 创建一个 MPSC 通道，用于从其他任务接收要发送的消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(64);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    // 当前连接的上下文信息，在加入牌桌后填充
    let mut player_context: Option<(TableId, PlayerId)> = None;

    // 主循环，处理从客户端接收到的消息
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(client_msg, state.clone(), &tx, &mut player_context).await;
                }
                Err(e) => {
                    warn!("解析消息失败: {}", e);
                    let _ = tx.send(ServerMessage::Error { message: format!("无法解析的消息: {}", e) }).await;
                }
            }
        }
    }

    // 客户端断开连接，执行清理工作
    if let Some((table_id, player_id)) = player_context {
        handle_disconnect(state, table_id, player_id).await;
    }
    info!("客户端连接关闭");
}

/// 核心消息处理逻辑
async fn handle_client_message(
    msg: ClientMessage,
    state: SharedState,
    tx: &mpsc::Sender<ServerMessage>,
    context: &mut Option<(TableId, PlayerId)>,
) {
    match msg {
        ClientMessage::CreateTable { nickname, seats } => {
            if context.is_some() {
                let _ = tx.send(ServerMessage::Error { message: "你已经在一张牌桌上了".to_string() }).await;
                return;
            }

            let table_id = Uuid::new_v4();
            let config = TableConfig { players: seats, ..TableConfig::default() };
            let mut table = match Table::new(table_id, config, state.next_rng()) {
                Ok(t) => t,
                Err(e) => {
                    let _ = tx.send(ServerMessage::Error { message: e.to_string() }).await;
                    return;
                }
            };
            let (player_id, seat) = match table.join(nickname) {
                Ok(joined) => joined,
                Err(e) => {
                    let _ = tx.send(ServerMessage::Error { message: e.to_string() }).await;
                    return;
                }
            };
            let view = table.view_for(player_id);

            let mut room = Room {
                table: P_Mutex::new(table),
                host_id: P_RwLock::new(player_id),
                players: RwLock::new(HashMap::new()),
            };
            room.players.get_mut().insert(player_id, PlayerConnection { sender: tx.clone() });
            state.tables.insert(table_id, Arc::new(room));

            info!("玩家 {} 创建了新牌桌 {} ({} 个座位)", player_id, table_id, seats);
            *context = Some((table_id, player_id));
            let _ = tx.send(ServerMessage::TableJoined { table_id, your_id: player_id, your_seat: seat, view }).await;
        }
        ClientMessage::JoinTable { table_id, nickname } => {
            if context.is_some() {
                let _ = tx.send(ServerMessage::Error { message: "你已经在一张牌桌上了".to_string() }).await;
                return;
            }

            let room = state.tables.get(&table_id).map(|r| r.clone());
            let Some(room) = room else {
                let _ = tx.send(ServerMessage::Error { message: "牌桌不存在".to_string() }).await;
                return;
            };

            let joined;
            {  // r_players write lock
                let mut r_players = room.players.write().await;

                {  // r_table lock
                    let mut table = room.table.lock();
                    joined = table.join(nickname.clone()).map(|(id, seat)| (id, seat, table.view_for(id)));
                }

                if let Ok((player_id, ..)) = &joined {
                    r_players.insert(*player_id, PlayerConnection { sender: tx.clone() });
                }
            }

            let (player_id, seat, view) = match joined {
                Ok(j) => j,
                Err(e) => {
                    let _ = tx.send(ServerMessage::Error { message: e.to_string() }).await;
                    return;
                }
            };

            *context = Some((table_id, player_id));
            {  // r_players read lock
                // 广播给牌桌内其他玩家
                let join_msg = ServerMessage::PlayerJoined { seat, nickname };
                broadcast(room.players.read().await.iter(), &join_msg, Some(player_id)).await;
            }
            let _ = tx.send(ServerMessage::TableJoined { table_id, your_id: player_id, your_seat: seat, view }).await;
        }
        // ... 其他需要加入牌桌后才能执行的消息
        _ => {
            let Some((table_id, player_id)) = *context else {
                let _ = tx.send(ServerMessage::Error { message: "请先加入或创建牌桌".to_string() }).await;
                return;
            };
            let room = state.tables.get(&table_id).map(|r| r.clone());
            let Some(room) = room else {
                let _ = tx.send(ServerMessage::Error { message: "牌桌不存在".to_string() }).await;
                return;
            };

            // 游戏逻辑处理
            let result: Result<Vec<ServerMessage>, String> = match msg {
                ClientMessage::StartRound => {
                    let host_id = *room.host_id.read();
                    if player_id != host_id {
                        Err("只有桌主可以开始游戏".to_string())
                    } else {
                        room.table.lock().start_round().map_err(|e| e.to_string())
                    }
                }
                ClientMessage::Play { cards } => {
                    room.table.lock().play(player_id, &cards).map_err(|e| e.to_string())
                }
                ClientMessage::Pass => room.table.lock().pass(player_id).map_err(|e| e.to_string()),
                ClientMessage::GetMyHand => {
                    let cards = room.table.lock().hand_of(player_id).unwrap_or_default();
                    Ok(vec![ServerMessage::YourHand { cards }])
                }
                ClientMessage::CreateTable { .. } | ClientMessage::JoinTable { .. } => {
                    Err("你已经在一张牌桌上了".to_string())
                }
            };

            let messages = match result {
                Ok(messages) => messages,
                Err(message) => {
                    // 错误消息只发给当前玩家，牌桌状态没有改变
                    let _ = tx.send(ServerMessage::Error { message }).await;
                    return;
                }
            };

            // 手牌只发给自己，其余事件发给整桌
            let (private, shared): (Vec<_>, Vec<_>) =
                messages.into_iter().partition(|m| matches!(m, ServerMessage::YourHand { .. }));
            for msg in private {
                let _ = tx.send(msg).await;
            }
            {  // r_players read lock
                let r_players = room.players.read().await;
                fan_out(&room.table, &r_players, &shared).await;
            }
        }
    }
}

/// 玩家断开连接后的处理
async fn handle_disconnect(state: SharedState, table_id: TableId, player_id: PlayerId) {
    info!("玩家 {} 从牌桌 {} 断开连接", player_id, table_id);
    let Some(room) = state.tables.get(&table_id).map(|r| r.clone()) else {
        return;
    };

    {  // r_players write lock
        let mut r_players = room.players.write().await;
        // 从连接映射中移除
        r_players.remove(&player_id);

        // 座位交给电脑，必要时电脑接着出牌
        let events = room.table.lock().leave(player_id);
        fan_out(&room.table, &r_players, &events).await;
    }

    {  // r_players read lock
        let r_players = room.players.read().await;

        // 如果桌主断开，转移桌主权限
        let host_id = *room.host_id.read();
        if player_id == host_id {
            if let Some(new_host_id) = r_players.keys().next().cloned() {
                *room.host_id.write() = new_host_id;
                let info_msg = {
                    let table = room.table.lock();
                    let new_host = match (table.seat_of(new_host_id), table.nickname_of(new_host_id)) {
                        (Some(seat), Some(nickname)) => format!("{} 号座位的 {}", seat, nickname),
                        _ => new_host_id.to_string(),
                    };
                    ServerMessage::Info { message: format!("桌主已断开，新桌主是 {}", new_host) }
                };
                broadcast(r_players.iter(), &info_msg, None).await;
                info!("牌桌 {} 的桌主已转移给 {}", table_id, new_host_id);
            }
        }

        // 判断是否清空牌桌
        if r_players.is_empty() {
            state.tables.remove(&table_id);
            info!("牌桌 {} 已空，已被移除", table_id);
        }
    }
}

/// 把牌桌事件依次发给桌上每个玩家，牌桌快照按接收者单独生成。
/// 牌桌锁只在生成每条消息时短暂持有，不跨越 await。
async fn fan_out(
    table: &P_Mutex<Table>,
    players: &HashMap<PlayerId, PlayerConnection>,
    messages: &[ServerMessage],
) {
    for msg in messages {
        for (player_id, conn) in players {
            let personalized = table.lock().personalize(msg, *player_id);
            if conn.sender.send(personalized).await.is_err() {
                warn!("向玩家 {} 发送消息失败（可能已断开）", player_id);
            }
        }
    }
}

/// 向牌桌内所有玩家广播消息
async fn broadcast(
    players: impl Iterator<Item=(&PlayerId, &PlayerConnection)>,
    message: &ServerMessage,
    exclude: Option<PlayerId>,
) {
    for (player_id, conn) in players {
        if Some(*player_id) == exclude {
            continue;
        }
        if conn.sender.send(message.clone()).await.is_err() {
            // 发送失败，说明该玩家也断开了，后续由其自己的 handle_socket 任务处理
            warn!("向玩家 {} 发送消息失败（可能已断开）", player_id);
        }
    }
}
