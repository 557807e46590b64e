//! Showtime terminal client
//!
//! A line-oriented front end over [`BookingSession`]: list shows, pick one,
//! toggle seats on a text seat map, hold and book them.

use anyhow::Context;
use chrono::NaiveDate;
use futures::future::join_all;
use showtime_booking::{BookingSession, Config, NoticeLevel, PosterResolver, SeatGrid};
use showtime_client::{SeatKey, SeatStatus, ShowId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Commands:
  shows [YYYY-MM-DD]   list shows (optionally for one date)
  show <id>            make a show active and print its seats
  seats                print the seat map of the active show
  toggle <A1> [B2 ..]  select or deselect seats
  clear                empty the selection
  hold                 hold the selected seats
  book                 book every seat you hold
  release              give back selected seats you hold
  bookings             list your bookings
  ticket <id>          show the ticket for a booking
  log                  recent activity
  logout               end the service login session
  help                 this text
  quit                 exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,showtime_booking=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "Starting showtime client");

    let session = BookingSession::connect(&config).context("failed to set up the session")?;
    let posters = PosterResolver::new(
        &config.api.base_url,
        config.posters.placeholder_base.clone(),
        config.request_timeout(),
    )
    .context("failed to set up the poster resolver")?;

    println!("=== Showtime ===");
    println!("Service: {}", config.api.base_url);
    println!("Type `help` for commands.\n");

    if let Err(error) = list_shows(&session, &posters, None).await {
        println!("error: {error}");
    }
    session.start_polling().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };

        if matches!(command, "quit" | "exit") {
            break;
        }
        if let Err(error) = run_command(&session, &posters, command, args).await {
            println!("error: {error}");
        }
    }

    println!("Shutting down...");
    session.shutdown().await?;
    Ok(())
}

fn print_prompt() {
    use std::io::Write;
    print!("> ");
    let _ = std::io::stdout().flush();
}

async fn run_command(
    session: &BookingSession,
    posters: &PosterResolver,
    command: &str,
    args: &[&str],
) -> anyhow::Result<()> {
    match command {
        "help" => println!("{HELP}"),
        "shows" => {
            let date = args
                .first()
                .map(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
                .transpose()
                .context("dates look like 2025-01-31")?;
            list_shows(session, posters, date).await?;
        },
        "show" => {
            let id: ShowId = args
                .first()
                .context("usage: show <id>")?
                .parse()
                .context("show ids are numbers")?;
            match session.select_show(id).await? {
                Some(grid) => print_grid(session, &grid).await,
                None => println!("Seat map not available yet; it will refresh shortly."),
            }
        },
        "seats" => match session.grid().await {
            Some(grid) => print_grid(session, &grid).await,
            None => println!("No seat map. Pick a show with `show <id>`."),
        },
        "toggle" => {
            anyhow::ensure!(!args.is_empty(), "usage: toggle <A1> [B2 ..]");
            for raw in args {
                let seat: SeatKey = raw.parse().map_err(anyhow::Error::msg)?;
                let selected = session.toggle(seat.clone()).await?;
                println!("{seat}: {}", if selected { "selected" } else { "not selected" });
            }
            println!("Total: {}", session.selection_total().await);
        },
        "clear" => {
            session.clear_selection().await?;
            println!("Selection cleared.");
        },
        "hold" => {
            let receipt = session.hold_selected().await?;
            match receipt.expires_at {
                Some(until) => println!("Held until {}.", until.format("%H:%M:%S UTC")),
                None => println!("Held."),
            }
        },
        "book" => {
            let receipt = session.book_held().await?;
            println!("Booked! Total paid: {}", receipt.total_paid);
        },
        "release" => {
            let seats = session.release_selected().await?;
            let seats: Vec<String> = seats.iter().map(SeatKey::seat_id).collect();
            println!("Released {}.", seats.join(", "));
        },
        "bookings" => {
            let bookings = session.my_bookings().await?;
            if bookings.is_empty() {
                println!("No bookings yet.");
            }
            for booking in bookings {
                println!(
                    "#{:<5} {:<28} {}{:<3} {:>8}",
                    booking.id, booking.movie, booking.row, booking.number, booking.price
                );
            }
        },
        "ticket" => {
            let id: i64 = args
                .first()
                .context("usage: ticket <booking id>")?
                .parse()
                .context("booking ids are numbers")?;
            let ticket = session.ticket(id).await?;
            println!("Ticket {}", ticket.ticket_id);
            println!("  {} / {} / {}", ticket.movie, ticket.screen, ticket.time);
            println!("  Seat {}  Price {}", ticket.seat, ticket.price);
            if !ticket.message.is_empty() {
                println!("  {}", ticket.message);
            }
        },
        "log" => {
            for notice in session.notices(15).await {
                let marker = match notice.level {
                    NoticeLevel::Info => " ",
                    NoticeLevel::Success => "+",
                    NoticeLevel::Warning => "!",
                    NoticeLevel::Error => "x",
                };
                println!("{} {marker} {}", notice.at.format("%H:%M:%S"), notice.message);
            }
        },
        "logout" => {
            session.logout().await?;
            println!("Logged out.");
        },
        other => println!("Unknown command `{other}`. Type `help`."),
    }
    Ok(())
}

async fn list_shows(
    session: &BookingSession,
    posters: &PosterResolver,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let shows = session.load_catalog(date).await?;
    if shows.is_empty() {
        println!("No shows scheduled.");
        return Ok(());
    }

    let resolved = join_all(shows.iter().map(|show| posters.resolve(show))).await;
    for (show, poster) in shows.iter().zip(resolved) {
        println!(
            "[{}] {:<28} {:<24} {}  {:>8}",
            show.id,
            show.movie,
            show.screen,
            show.start_time.format("%Y-%m-%d %H:%M"),
            show.price
        );
        println!("      poster: {}", poster.url());
    }
    Ok(())
}

async fn print_grid(session: &BookingSession, grid: &SeatGrid) {
    if let Some(show) = session.active_show().await {
        println!("{} ({}) at {}", show.movie, show.screen, show.price);
    }

    for row in &grid.rows {
        let cells: String = row
            .seats
            .iter()
            .map(|seat| match (seat.selected, seat.effective, seat.expired_hold) {
                (true, _, _) => " * ",
                (false, SeatStatus::Booked, _) => " X ",
                (false, SeatStatus::Held, _) => " H ",
                (false, SeatStatus::Available, true) => " ~ ",
                (false, SeatStatus::Available, false) => " . ",
            })
            .collect();
        println!("{:>3} {cells}", row.label);
    }

    println!(
        "available {}  held {}  booked {}   (* selected, ~ lapsed hold)",
        grid.stats.available, grid.stats.held, grid.stats.booked
    );
    let selection = session.selection().await;
    if !selection.is_empty() {
        let ids: Vec<&str> = selection.iter().map(|entry| entry.seat_id.as_str()).collect();
        println!(
            "Selected: {}  Total: {}",
            ids.join(", "),
            session.selection_total().await
        );
    }
}
