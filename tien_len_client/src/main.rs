use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use tien_len_core::{ClientMessage, ServerMessage, TableId, TableView, parse_cards};

const DEFAULT_URL: &str = "ws://127.0.0.1:25917/ws";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url_arg = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string());
    let url = Url::parse(&url_arg)?;

    println!("正在连接到: {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(server_msg) => {
                            println!("\n<-- {}", describe(&server_msg));
                            print!("> "); // 重新显示输入提示符
                            let _ = std::io::stdout().flush();
                        }
                        Err(e) => eprintln!("解析服务器消息失败: {}", e),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 越南扑克客户端 ---");
    println!("可用命令:");
    println!("  create <昵称> [座位数]     - 创建一张新牌桌 (默认 4 个座位)");
    println!("  join <牌桌ID> <昵称>       - 加入一张牌桌");
    println!("  start                      - 开始新的一局 (仅桌主)");
    println!("  play <牌...>               - 出牌，例如 play 3♠ 4♠ 5♠ 或 play 3s 4s 5s");
    println!("  pass                       - 过牌");
    println!("  hand                       - 查看手牌");
    println!("  exit                       - 退出");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts.first().cloned();

        let client_msg = match command {
            Some("create") => {
                let nickname = parts.get(1).unwrap_or(&"新玩家").to_string();
                let seats = match parts.get(2).map(|s| s.parse::<usize>()) {
                    Some(Ok(n)) => n,
                    Some(Err(_)) => {
                        println!("用法: create <昵称> [座位数]");
                        continue;
                    }
                    None => 4,
                };
                ClientMessage::CreateTable { nickname, seats }
            }
            Some("join") => {
                if parts.len() < 3 {
                    println!("用法: join <牌桌ID> <昵称>");
                    continue;
                }
                let Ok(table_id) = parts[1].parse::<TableId>() else {
                    println!("无效的牌桌ID格式");
                    continue;
                };
                let nickname = parts[2].to_string();
                ClientMessage::JoinTable { table_id, nickname }
            }
            Some("start") => ClientMessage::StartRound,
            Some("play") => match parse_cards(&parts[1..].join(" ")) {
                Some(cards) if !cards.is_empty() => ClientMessage::from(cards),
                _ => {
                    println!("用法: play <牌...>，例如 play 10♥ 10♠");
                    continue;
                }
            },
            Some("pass") => ClientMessage::Pass,
            Some("hand") => ClientMessage::GetMyHand,
            Some("exit") => {
                println!("正在断开连接...");
                break;
            }
            _ => {
                println!("未知命令: {}", line);
                continue;
            }
        };

        let payload = serde_json::to_string(&client_msg)?;
        write.send(Message::Text(payload.into())).await?;
    }

    Ok(())
}

fn join_cards(cards: &[tien_len_core::Card]) -> String {
    cards.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" ")
}

fn describe_view(view: &TableView) -> String {
    let table = view.last_combo.as_ref().map_or("(空)".to_string(), |c| c.to_string());
    format!(
        "桌面: {} | 轮到 {} 号 | 各座位剩余: {:?} | 我的手牌: {}",
        table,
        view.current_player,
        view.hand_sizes,
        join_cards(&view.your_hand)
    )
}

/// 把服务器消息转成一行可读文本
fn describe(msg: &ServerMessage) -> String {
    match msg {
        ServerMessage::TableJoined { table_id, your_seat, view, .. } => {
            format!("已加入牌桌 {}，你在 {} 号座位。{}", table_id, your_seat, describe_view(view))
        }
        ServerMessage::PlayerJoined { seat, nickname } => format!("{} 坐到了 {} 号座位", nickname, seat),
        ServerMessage::PlayerLeft { seat } => format!("{} 号座位的玩家离开了，由电脑接管", seat),
        ServerMessage::RoundStarted { first } => format!("新的一局开始，{} 号座位先出", first),
        ServerMessage::Played { seat, combo, remaining } => {
            format!("{} 号座位出了 {}，还剩 {} 张", seat, combo, remaining)
        }
        ServerMessage::Passed { seat } => format!("{} 号座位过牌", seat),
        ServerMessage::TrickCleared { leader } => format!("桌面清空，{} 号座位重新出牌", leader),
        ServerMessage::NextToAct { seat } => format!("轮到 {} 号座位", seat),
        ServerMessage::RoundOver { winner } => format!("本局结束，{} 号座位获胜!", winner),
        ServerMessage::TableSnapshot(view) => describe_view(view),
        ServerMessage::YourHand { cards } => format!("你的手牌: {}", join_cards(cards)),
        ServerMessage::Info { message } => format!("[提示] {}", message),
        ServerMessage::Error { message } => format!("[错误] {}", message),
    }
}
