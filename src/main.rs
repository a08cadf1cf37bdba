use chess_rules::{Game, Square};

/// Scripted showcase: plays the scholar's mate through the engine, printing
/// the board and phase after every move, then unwinds the final blunder.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_rules=debug".into()),
        )
        .init();

    let mut game = Game::new();
    println!("game {} started\n{}\n", game.id, game.board());

    let script = [
        ("e2", "e4"),
        ("e7", "e5"),
        ("f1", "c4"),
        ("b8", "c6"),
        ("d1", "h5"),
        ("g8", "f6"),
        ("h5", "f7"),
    ];

    for (from, to) in script {
        let from = Square::from_algebraic(from).expect("scripted square");
        let to = Square::from_algebraic(to).expect("scripted square");
        let state = game.apply_move(from, to);
        println!("{from} -> {to}  [{state}]\n{}\n", game.board());
    }

    let state = game.undo();
    println!("undo  [{state}]\n{}", game.board());
}
