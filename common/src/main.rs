use chainsweep::host::{Board, Tally};
use chainsweep::*;
use rand::prelude::IndexedRandom;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

const WIDTH: usize = 10;
const HEIGHT: usize = 10;
const MINES: usize = 12;
const MOVE_DELAY: Duration = Duration::from_millis(500);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    // --- 1. Initialization ---
    let mut rng = rand::rng();
    let start = Point::new(WIDTH / 2, HEIGHT / 2);
    let board = Board::random(WIDTH, HEIGHT, MINES, start, &mut rng)?;

    let worker = spawn();
    let mut tally = Tally::new(WIDTH, HEIGHT);
    worker.send(HostMessage::Init {
        mines: MINES,
        rows: board.rows.clone(),
    })?;

    println!("--- Chain Engine Minesweeper Bot ---");
    println!("Strategy: play proven safe cells, otherwise guess among the least likely mines.");

    let mut revealed: HashSet<Point> = HashSet::new();
    let mut flagged: Vec<Point> = Vec::new();
    let mut next = Some(start);
    let mut move_count = 0;
    let mut lost = false;

    // --- 2. Game Loop ---
    while let Some(at) = next {
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);
        println!("Bot reveals ({}, {})...", at.x, at.y);

        let batch = board.cascade(at, &revealed);
        revealed.extend(batch.iter().copied());
        worker.send(tally.reveal(&batch))?;

        if board.is_mine(at) {
            lost = true;
            print_board(&board, &revealed, &flagged);
            break;
        }
        if revealed.len() + MINES == WIDTH * HEIGHT {
            print_board(&board, &revealed, &flagged);
            break;
        }

        // --- 3. Bot's Decision Logic ---
        flagged = ask(&worker, &mut tally, RequestKind::Flags)?;
        print_board(&board, &revealed, &flagged);

        let safes = ask(&worker, &mut tally, RequestKind::Safes)?;
        next = safes.into_iter().find(|p| !revealed.contains(p));
        if next.is_some() {
            println!("Engine proved a safe cell.");
        } else {
            let lowest = ask(&worker, &mut tally, RequestKind::Lowest)?;
            println!(
                "No proven safe cell. Guessing among {} least likely cells...",
                lowest.len()
            );
            next = lowest.choose(&mut rng).copied();
        }

        thread::sleep(MOVE_DELAY);
    }

    // --- 4. Final Result ---
    println!("\n--- Game Over after {} moves ---", move_count);
    if lost {
        println!("Result: The bot hit a mine and lost.");
    } else if revealed.len() + MINES == WIDTH * HEIGHT {
        println!("Result: The bot won!");
    } else {
        println!("Result: The engine had no cell to suggest.");
    }

    worker.shutdown()
}

/// Sends a request and waits for the answer that matches the host's
/// current reveals, dropping any stale ones.
fn ask(worker: &Worker, tally: &mut Tally, kind: RequestKind) -> anyhow::Result<Vec<Point>> {
    worker.send(tally.request(kind))?;
    loop {
        let Some(response) = worker.recv_timeout(RESPONSE_TIMEOUT)? else {
            anyhow::bail!("engine_timeout");
        };
        if let Some(cells) = tally.accept(response) {
            return Ok(cells);
        }
    }
}

fn print_board(board: &Board, revealed: &HashSet<Point>, flagged: &[Point]) {
    // Print header
    print!("   ");
    for x in 0..board.width {
        print!("{:^3}", x);
    }
    println!("\n  +{}", "---".repeat(board.width));

    // Print rows
    for y in 0..board.height {
        print!("{:^2}|", y);
        for x in 0..board.width {
            let point = Point::new(x, y);
            let display = if !revealed.contains(&point) {
                if flagged.contains(&point) {
                    " F ".to_string()
                } else {
                    " ■ ".to_string()
                }
            } else {
                match board.tile(point) {
                    Tile::Mine => " * ".to_string(),
                    Tile::Clue(0) => " 0 ".to_string(),
                    Tile::Clue(n) => format!(" {} ", n),
                    Tile::Unknown => " ? ".to_string(),
                }
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
