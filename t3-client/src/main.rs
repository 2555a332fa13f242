use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use protocol::{GameType, NewGameRequest, Piece, Position};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use t3_client::settings::LogLevel;
use t3_client::view::{render_board, render_network, render_state};
use t3_client::{
    ClientSettings, GameService, HttpGameService, InteractionState, MoveHistory, Phase, TurnController,
};

#[derive(Parser)]
#[command(name = "t3-client", version, about = "Play Tic-Tac-Toe against a server-hosted AI")]
struct Cli {
    /// 游戏服务地址（覆盖设置文件与 T3_SERVER_URL）
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 继续一局已有的对局
    Play { uuid: String },
    /// 创建新对局
    New {
        #[arg(long, value_enum, default_value_t = Mode::NeuralNetwork)]
        mode: Mode,
        /// 人类执子
        #[arg(long, value_enum, default_value_t = Side::X)]
        piece: Side,
        #[arg(long, default_value = "t3-client")]
        name: String,
        /// 创建后立即开始
        #[arg(long)]
        play: bool,
    },
    /// 打印走棋历史
    History { uuid: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Minimax,
    NeuralNetwork,
}

impl From<Mode> for GameType {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Minimax => GameType::Minimax,
            Mode::NeuralNetwork => GameType::NeuralNetwork,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    X,
    O,
}

impl From<Side> for Piece {
    fn from(side: Side) -> Self {
        match side {
            Side::X => Piece::X,
            Side::O => Piece::O,
        }
    }
}

fn init_tracing(level: LogLevel) -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(format!("t3_client={}", level.as_directive()).parse()?))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = ClientSettings::load().with_server_override(cli.server);

    // 初始化日志
    init_tracing(settings.log_level)?;
    info!("Using game service at {}", settings.server_url);

    let service = Arc::new(
        HttpGameService::new(settings.server_url.clone(), settings.request_timeout())
            .context("Failed to create HTTP client")?,
    );

    match cli.command {
        Command::Play { uuid } => play(service, &settings, uuid).await,
        Command::New {
            mode,
            piece,
            name,
            play: start,
        } => {
            let request = NewGameRequest::new(name, mode.into(), piece.into());
            let created = service
                .create_game(&request)
                .await
                .context("Failed to create game")?;
            println!("Created {:?} game {}", created.game_type, created.uuid);
            if start {
                play(service, &settings, created.uuid).await?;
            }
            Ok(())
        }
        Command::History { uuid } => print_history(service.as_ref(), &uuid).await,
    }
}

async fn play(service: Arc<HttpGameService>, settings: &ClientSettings, uuid: String) -> Result<()> {
    let mut controller = TurnController::new(uuid.clone(), service.clone(), settings);
    let mut rx = controller.subscribe();
    controller.mount();

    let render = tokio::spawn(async move {
        let interaction = InteractionState::default();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            println!("\n{}", render_state(&state, &interaction));
            if state.phase == Phase::Animating && state.trace.is_some() {
                println!("{}", render_network(&state.network));
            }
        }
    });

    let mut history: Option<MoveHistory> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let input = line.trim();
        match input {
            "q" | "quit" => break,
            "p" | "prev" | "n" | "next" => {
                if controller.state().phase != Phase::GameOver {
                    println!("Move history is available once the game is over");
                    continue;
                }
                if history.is_none() {
                    let fetched = MoveHistory::fetch(service.as_ref(), &uuid)
                        .await
                        .context("Failed to fetch move history")?;
                    history = Some(fetched);
                }
                let Some(history) = history.as_mut() else {
                    continue;
                };
                let record = if input.starts_with('p') {
                    history.previous()
                } else {
                    history.next()
                };
                match record.cloned() {
                    Some(record) => {
                        controller.review(record);
                    }
                    None => println!("No more moves"),
                }
            }
            _ => match input.parse::<u8>().ok().and_then(Position::from_number) {
                Some(position) => {
                    controller.play_move(position);
                }
                None => println!("Enter a cell number 1-9, 'p'/'n' to review, or 'q' to quit"),
            },
        }
    }

    controller.unmount();
    render.abort();
    Ok(())
}

async fn print_history(service: &dyn GameService, uuid: &str) -> Result<()> {
    let game = service.fetch_game(uuid).await.context("Failed to fetch game")?;
    let history = MoveHistory::fetch(service, uuid)
        .await
        .context("Failed to fetch move history")?;

    for record in history.records() {
        let board = record
            .board(game.player_1_piece, game.player_2_piece)
            .with_context(|| format!("Malformed board in move {}", record.move_event.move_sequence))?;
        let mover = if record.move_event.player_id == protocol::HUMAN_PLAYER_ID {
            "Human"
        } else {
            "AI"
        };
        println!("\n#{} {}", record.move_event.move_sequence, mover);
        println!("{}", render_board(&board, None, &InteractionState::default()));
        if let Some(trace) = record.trace.as_ref() {
            let ranked: Vec<String> = trace.ranked_moves().iter().map(Position::to_string).collect();
            println!("ranked: {}", ranked.join(" "));
        }
    }
    Ok(())
}
