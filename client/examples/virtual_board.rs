use dtekv_board_client::{BoardEvent, Difficulty, Direction, Outcome, VirtualBoard};
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let board = VirtualBoard::new("http://localhost:8000")?;
    let mut events = board.subscribe_to_events().await;

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                BoardEvent::FrameUpdated { cursor, outcome } => {
                    println!("🖥️  cursor at {cursor}, {outcome:?}");
                    match outcome {
                        Outcome::Won => println!("🎉 You won!"),
                        Outcome::Lost => println!("💣 Game over!"),
                        Outcome::Running => {}
                    }
                }
                BoardEvent::Menu => println!("📋 Back to the menu"),
                BoardEvent::ConnectionLost => {
                    println!("🔌 Connection lost!");
                    break;
                }
            }
        }
    });

    board.start(Difficulty::Easy, Some(2024)).await?;
    println!("Board started! Session ID: {:?}", board.get_session_id().await);

    // Open the middle of the board, then flag a corner.
    for _ in 0..3 {
        board.step(Direction::Down).await?;
        board.step(Direction::Right).await?;
    }
    board.reveal().await?;
    board.step(Direction::Up).await?;
    board.toggle_flag().await?;

    sleep(Duration::from_millis(500)).await;
    if let Some(frame) = board.frame().await {
        for row in &frame.field {
            let line: String = row
                .iter()
                .map(|cell| match cell {
                    dtekv_board_client::Cell::Hidden => '#',
                    dtekv_board_client::Cell::Flagged => 'F',
                    dtekv_board_client::Cell::Revealed { adjacent: 0 } => '.',
                    dtekv_board_client::Cell::Revealed { adjacent } => {
                        char::from_digit(u32::from(*adjacent), 10).unwrap_or('?')
                    }
                    dtekv_board_client::Cell::Mine { .. } => '*',
                })
                .collect();
            println!("{line}");
        }
        println!("{} mines left", frame.mines_remaining);
    }

    board.disconnect().await?;
    printer.abort();
    Ok(())
}
