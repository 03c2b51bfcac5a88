use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use log::LevelFilter;

use pumpking::bitboard::AttackTables;
use pumpking::board::{Board, STARTING_POSITION_FEN};
use pumpking::engine::Engine;
use pumpking::game::Game;
use pumpking::perft::{perft, perft_divide};
use pumpking::search::SearchConfig;
use pumpking::tt::MAX_TT_BITS;

#[derive(Parser, Debug)]
#[command(name = "pumpking")]
#[command(about = "Bitboard chess engine: perft, move selection and self-play")]
struct Cli {
    /// Log search progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count legal move paths to a fixed depth
    Perft {
        #[arg(long, default_value = STARTING_POSITION_FEN)]
        fen: String,

        #[arg(short, long, default_value_t = 4)]
        depth: u32,

        /// Print the node count below each root move
        #[arg(long)]
        divide: bool,
    },

    /// Pick a move for the side to move
    Bestmove {
        #[arg(long, default_value = STARTING_POSITION_FEN)]
        fen: String,

        /// Search time per move in milliseconds
        #[arg(long, default_value_t = 1000)]
        time_ms: u64,

        /// Skip the opening book
        #[arg(long)]
        no_book: bool,

        /// Transposition table holds 2^hash_bits entries
        #[arg(
            long,
            default_value_t = 20,
            value_parser = clap::value_parser!(u32).range(1..=MAX_TT_BITS as i64)
        )]
        hash_bits: u32,
    },

    /// Let the engine play itself
    Play {
        /// Number of full moves to play
        #[arg(short, long, default_value_t = 40)]
        moves: u32,

        #[arg(long, default_value_t = 1000)]
        time_ms: u64,

        #[arg(long, default_value = STARTING_POSITION_FEN)]
        fen: String,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::Perft { fen, depth, divide } => run_perft(&fen, depth, divide),
        Command::Bestmove {
            fen,
            time_ms,
            no_book,
            hash_bits,
        } => {
            let config = SearchConfig::default()
                .with_time_limit(Duration::from_millis(time_ms))
                .with_book(!no_book)
                .with_tt_bits(hash_bits);
            run_bestmove(&fen, config)
        }
        Command::Play { moves, time_ms, fen } => {
            let config = SearchConfig::default().with_time_limit(Duration::from_millis(time_ms));
            run_play(&fen, moves, config)
        }
    }
}

fn run_perft(fen: &str, depth: u32, divide: bool) -> color_eyre::Result<()> {
    let board = Board::from_fen(fen)?;
    let tables = AttackTables::new();
    let start = Instant::now();

    let nodes = if divide {
        let counts = perft_divide(&tables, &board, depth);
        for (mv, count) in &counts {
            println!("{}: {}", mv, count);
        }
        counts.iter().map(|(_, count)| count).sum()
    } else {
        perft(&tables, &board, depth)
    };

    let elapsed = start.elapsed().as_secs_f64();
    println!();
    println!("Nodes searched: {}", nodes);
    println!("Time: {:.3}s ({:.0} nps)", elapsed, nodes as f64 / elapsed.max(1e-9));
    Ok(())
}

fn run_bestmove(fen: &str, config: SearchConfig) -> color_eyre::Result<()> {
    let board = Board::from_fen(fen)?;
    let mut engine = Engine::new(config)?;

    let report = engine.search(&board);
    let mv = report
        .best_move
        .ok_or_else(|| eyre!("no legal move in position {}", fen))?;
    if log::log_enabled!(log::Level::Info) {
        report.print();
    }
    println!("bestmove {}", mv);
    Ok(())
}

fn run_play(fen: &str, moves: u32, config: SearchConfig) -> color_eyre::Result<()> {
    let mut engine = Engine::new(config)?;
    let mut game = Game::from_fen(fen)?;
    println!("{}", game.board().draw_board());

    game.play(&mut engine, moves);
    println!("{}", game.to_pgn());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bits_bounded() {
        let cli = Cli::try_parse_from(["pumpking", "bestmove", "--hash-bits", "16"]).unwrap();
        assert!(matches!(cli.command, Command::Bestmove { hash_bits: 16, .. }));

        assert!(Cli::try_parse_from(["pumpking", "bestmove", "--hash-bits", "64"]).is_err());
        assert!(Cli::try_parse_from(["pumpking", "bestmove", "--hash-bits", "0"]).is_err());
    }
}
