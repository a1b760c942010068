//! CLI definition and dispatch.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::category::Category;
use crate::domain::error::MarketError;
use crate::domain::history::{HistoryFilter, TransferRecord};
use crate::domain::listing::Listing;
use crate::domain::market::TeamOverview;
use crate::domain::player::Player;
use crate::domain::{ListingId, PlayerId, TeamId, UserId};
use crate::logging::{LoggingConfig, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "transfermarket", about = "Fantasy football transfer market")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true, default_value = "market.ini")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database schema
    Init,
    /// Create a team with a freshly generated squad
    GenerateTeam {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        owner: Option<UserId>,
    },
    /// Create a free agent
    CreatePlayer {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        age: u8,
        #[arg(long)]
        category: Category,
        #[arg(long)]
        price: String,
    },
    /// Sign a free agent to a team
    Sign {
        #[arg(long)]
        team: TeamId,
        #[arg(long)]
        player: PlayerId,
    },
    /// Release a player from its team
    Release {
        #[arg(long)]
        player: PlayerId,
    },
    /// Set a player's price
    Reprice {
        #[arg(long)]
        player: PlayerId,
        #[arg(long)]
        price: String,
    },
    /// Delete a team, releasing its players
    DeleteTeam {
        #[arg(long)]
        team: TeamId,
    },
    /// Delete a player
    DeletePlayer {
        #[arg(long)]
        player: PlayerId,
    },
    /// Put a player on the transfer list
    List {
        #[arg(long)]
        player: PlayerId,
        #[arg(long)]
        price: String,
    },
    /// Take a player off the transfer list
    Delist {
        #[arg(long)]
        player: PlayerId,
    },
    /// Buy a listed player
    Buy {
        #[arg(long)]
        listing: ListingId,
        #[arg(long)]
        team: TeamId,
    },
    /// Recompute a team's value from its players
    Recalc {
        #[arg(long)]
        team: TeamId,
    },
    /// Show a team and its players
    Team {
        #[arg(long)]
        team: TeamId,
        /// Check the roster counters against the players
        #[arg(long)]
        audit: bool,
    },
    /// Search the transfer list
    Market {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        team_name: Option<String>,
        #[arg(long)]
        age: Option<u8>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        price: Option<String>,
    },
    /// Show completed transfers
    History {
        #[arg(long)]
        player: Option<PlayerId>,
        #[arg(long)]
        team: Option<TeamId>,
        #[arg(long)]
        since: Option<NaiveDate>,
        #[arg(long)]
        until: Option<NaiveDate>,
        /// Write the result to a CSV file instead of stdout
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(&cli.config) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_tracing(&LoggingConfig::from_config(&config));

    #[cfg(feature = "sqlite")]
    {
        let mut stdout = std::io::stdout().lock();
        match execute(&cli.command, &config, &mut stdout) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, cli.command);
        eprintln!("error: sqlite feature is required");
        ExitCode::from(1)
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

#[cfg(feature = "sqlite")]
pub type SqliteMarket = crate::domain::market::TransferMarket<
    crate::adapters::sqlite_adapter::SqliteAdapter,
    crate::adapters::rand_adapter::StdRandom,
>;

/// Build a market over the configured SQLite database, creating the schema
/// if it is missing.
#[cfg(feature = "sqlite")]
pub fn open_market(config: &dyn crate::ports::config_port::ConfigPort) -> Result<SqliteMarket, MarketError> {
    use crate::adapters::rand_adapter::StdRandom;
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::domain::market::TransferMarket;
    use crate::domain::market_config::build_market_config;

    let market_config = build_market_config(config)?;
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    let random = StdRandom::from_seed_option(market_config.seed);
    Ok(TransferMarket::new(store, random, market_config))
}

/// Run one command, writing its report to `out`.
#[cfg(feature = "sqlite")]
pub fn execute(
    command: &Command,
    config: &FileConfigAdapter,
    out: &mut dyn Write,
) -> Result<(), MarketError> {
    use crate::domain::listing::ListingCriteria;
    use crate::domain::money::parse_money;

    let market = open_market(config)?;

    match command {
        Command::Init => {
            writeln!(out, "schema ready")?;
        }
        Command::GenerateTeam {
            name,
            country,
            owner,
        } => {
            let overview = market.generate_team(name.as_deref(), country.as_deref(), *owner)?;
            write_overview(out, &overview)?;
        }
        Command::CreatePlayer {
            first_name,
            last_name,
            country,
            age,
            category,
            price,
        } => {
            let price = parse_money("price", price)?;
            let player =
                market.create_player(first_name, last_name, country, *age, *category, price)?;
            write_player(out, &player)?;
        }
        Command::Sign { team, player } => {
            market.sign_free_agent(*team, *player)?;
            write_overview(out, &market.team_overview(*team)?)?;
        }
        Command::Release { player } => {
            let player = market.release_player(*player)?;
            write_player(out, &player)?;
        }
        Command::Reprice { player, price } => {
            let price = parse_money("price", price)?;
            let player = market.reprice_player(*player, price)?;
            write_player(out, &player)?;
        }
        Command::DeleteTeam { team } => {
            let released = market.delete_team(*team)?;
            writeln!(out, "team {team} deleted, {} players released", released.len())?;
        }
        Command::DeletePlayer { player } => {
            market.delete_player(*player)?;
            writeln!(out, "player {player} deleted")?;
        }
        Command::List { player, price } => {
            let price = parse_money("price", price)?;
            let listing = market.list_player(*player, price)?;
            write_listing(out, &listing, &market.player(listing.player_id)?)?;
        }
        Command::Delist { player } => {
            let listing = market.delist_player(*player)?;
            writeln!(out, "listing {} closed", listing.id)?;
        }
        Command::Buy { listing, team } => {
            let outcome = market.buy_player(*listing, *team)?;
            writeln!(
                out,
                "transfer {}: player {} to team {} for {} (price {} -> {})",
                outcome.record.id,
                outcome.player.id,
                outcome.buyer.id,
                outcome.record.sell_price,
                outcome.previous_price,
                outcome.player.price
            )?;
            writeln!(out, "buyer budget {}", outcome.buyer.budget)?;
            if let Some(seller) = &outcome.seller {
                writeln!(out, "seller {} budget {}", seller.id, seller.budget)?;
            }
        }
        Command::Recalc { team } => {
            let value = market.recalculate_team_value(*team)?;
            writeln!(out, "team {team} value {value}")?;
        }
        Command::Team { team, audit } => {
            write_overview(out, &market.team_overview(*team)?)?;
            if *audit {
                let consistent = market.audit_roster(*team)?;
                writeln!(
                    out,
                    "roster audit: {}",
                    if consistent { "ok" } else { "MISMATCH" }
                )?;
            }
        }
        Command::Market {
            country,
            name,
            team_name,
            age,
            category,
            price,
        } => {
            let criteria = ListingCriteria {
                asking_price: price
                    .as_deref()
                    .map(|p| parse_money("price", p))
                    .transpose()?,
                country: country.clone(),
                name: name.clone(),
                team_name: team_name.clone(),
                age: *age,
                category: *category,
            };
            let listings = market.search_listings(market.store(), &criteria)?;
            for listing in &listings {
                write_listing(out, listing, &market.player(listing.player_id)?)?;
            }
            writeln!(out, "{} listings", listings.len())?;
        }
        Command::History {
            player,
            team,
            since,
            until,
            csv,
        } => {
            let filter = HistoryFilter {
                player_id: *player,
                team_id: *team,
                since: since.map(start_of_day),
                until: until.map(end_of_day),
            };
            let records = market.transfer_history(&filter)?;
            match csv {
                Some(path) => {
                    crate::adapters::csv_adapter::write_history_file(path, &records)?;
                    writeln!(out, "{} transfers written to {}", records.len(), path.display())?;
                }
                None => {
                    for record in &records {
                        write_record(out, record)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date)
        .checked_add_signed(TimeDelta::days(1))
        .map(|next| next - TimeDelta::nanoseconds(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn write_player(out: &mut dyn Write, player: &Player) -> std::io::Result<()> {
    let team = match player.team_id {
        Some(id) => format!("team {id}"),
        None => "free agent".to_string(),
    };
    writeln!(
        out,
        "#{} {:<3} {} ({}, {}) price {} [{}]",
        player.id,
        player.category,
        player.full_name(),
        player.country,
        player.age,
        player.price,
        team
    )
}

fn write_overview(out: &mut dyn Write, overview: &TeamOverview) -> std::io::Result<()> {
    let team = &overview.team;
    writeln!(
        out,
        "team {} {} ({}) budget {} value {}",
        team.id, team.name, team.country, team.budget, team.value
    )?;
    if let Some(owner) = team.owner {
        writeln!(out, "owner {owner}")?;
    }
    let roster = &team.roster;
    writeln!(
        out,
        "GK {} DEF {} MID {} FWD {} ({} players)",
        roster.goalkeepers,
        roster.defenders,
        roster.midfielders,
        roster.forwards,
        team.player_count()
    )?;
    for player in &overview.players {
        write_player(out, player)?;
    }
    Ok(())
}

fn write_listing(out: &mut dyn Write, listing: &Listing, player: &Player) -> std::io::Result<()> {
    writeln!(
        out,
        "listing {} asking {} listed {}: {} {} ({}, {})",
        listing.id,
        listing.asking_price,
        listing.listed_at.format("%Y-%m-%d %H:%M"),
        player.category,
        player.full_name(),
        player.country,
        player.age
    )
}

fn write_record(out: &mut dyn Write, record: &TransferRecord) -> std::io::Result<()> {
    let seller = record
        .selling_team
        .map(|id| format!("team {id}"))
        .unwrap_or_else(|| "free agency".to_string());
    writeln!(
        out,
        "transfer {} {}: player {} from {} to team {} for {}",
        record.id,
        record.transferred_at.format("%Y-%m-%d %H:%M:%S"),
        record.player_id,
        seller,
        record.buying_team,
        record.sell_price
    )
}
