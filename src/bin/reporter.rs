use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::prelude::*;
use structopt::StructOpt;
use tracing::{debug, trace};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use finstat::{
    interval::Granularity,
    money::RateBook,
    parser,
    stats::{
        AccountsReducer, CountReducer, GoalsReducer, IncomeExpenseReducer, MonthlyComparison,
        Series, YearlyComparison,
    },
    store::OperationStore,
    utils::round_to_fixed,
    Dataset, Predicate, Sweep, TimeSpan,
};

#[derive(StructOpt)]
#[structopt(name = "finstat-report", about = "Time-bucketed statistics over a personal finance log")]
pub struct Options {
    #[structopt(subcommand)]
    reporter: Reporter,
}

#[derive(StructOpt, Debug)]
pub struct GlobalOptions {
    /// Data file with accounts, categories and operations
    #[structopt(long, name = "data")]
    data: PathBuf,

    /// Directory of monthly exchange rate files
    #[structopt(long)]
    rates: Option<PathBuf>,

    /// Currency every amount is reported in
    #[structopt(long, default_value = "USD")]
    currency: String,

    /// Filter query, e.g. `type:expense and not tag:work`
    #[structopt(long)]
    filter: Option<String>,

    #[structopt(long)]
    from: Option<NaiveDate>,

    #[structopt(long)]
    to: Option<NaiveDate>,

    /// Date treated as today, defaults to the current UTC date
    #[structopt(long)]
    today: Option<NaiveDate>,

    /// More output per occurrence
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

#[derive(StructOpt, Debug)]
pub enum Reporter {
    /// Operation counts with income and expense totals
    #[structopt(name = "summary")]
    Summary {
        #[structopt(flatten)]
        global: GlobalOptions,
    },

    /// Monthly balance across all accounts
    #[structopt(name = "accounts")]
    Accounts {
        #[structopt(flatten)]
        global: GlobalOptions,
    },

    /// Net amounts per month across years, and per year
    #[structopt(name = "compare")]
    Compare {
        #[structopt(flatten)]
        global: GlobalOptions,
    },

    /// Yearly goal progress per category
    #[structopt(name = "goals")]
    Goals {
        #[structopt(flatten)]
        global: GlobalOptions,

        #[structopt(long)]
        year: Option<i32>,
    },
}

impl Reporter {
    pub fn global(&self) -> &GlobalOptions {
        match self {
            Self::Summary { global }
            | Self::Accounts { global }
            | Self::Compare { global }
            | Self::Goals { global, .. } => global,
        }
    }
}

impl GlobalOptions {
    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn predicate(&self) -> Result<Predicate> {
        let text = self.filter.as_deref().unwrap_or_default();

        match parser::parse_string(text) {
            Ok(predicate) => Ok(predicate),
            Err(e) => {
                eprint!("{}", e.report(true));
                bail!("Invalid filter `{}`", text)
            }
        }
    }

    fn span(&self, store: &OperationStore) -> Result<Option<TimeSpan>> {
        if self.from.is_none() && self.to.is_none() {
            return Ok(None);
        }

        let today = self.today();
        let start = match self.from {
            Some(from) => from,
            None => store.first_date()?.unwrap_or(today),
        };
        let end = match self.to {
            Some(to) => to,
            None => store.last_date()?.unwrap_or(today),
        };

        if start > end {
            bail!("--from {} is after --to {}", start, end);
        }

        Ok(Some(TimeSpan::new(start, end)))
    }

    fn rate_book(&self) -> Result<RateBook> {
        match &self.rates {
            Some(dir) => RateBook::load_dir(dir),
            None => Ok(RateBook::new()),
        }
    }
}

pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!(
            "finstat={},{}={}",
            level,
            env!("CARGO_CRATE_NAME"),
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_series(title: &str, series: &Series) {
    println!("{}", title);

    for (total, change) in series.total.iter().zip(series.change.iter()) {
        println!(
            "  {}  {:>14.2}  {:>+14.2}",
            total.date,
            round_to_fixed(total.value, 2),
            round_to_fixed(change.value, 2)
        );
    }
}

fn main() -> Result<()> {
    let options = Options::from_args();
    let global = options.reporter.global();

    init_logger(global.log_level());
    trace!("{:?}", options.reporter);

    let data = Dataset::from_file(&global.data)?;
    let store = data.store();
    let rates = global.rate_book()?;
    let predicate = global.predicate()?;
    let span = global.span(&store)?;
    let today = global.today();
    let sweep = Sweep::new(&store, today);

    debug!(filter = %predicate, currency = %global.currency, "running report");

    match &options.reporter {
        Reporter::Summary { .. } => {
            let mut counts = CountReducer::new();
            let mut totals = IncomeExpenseReducer::new(global.currency.as_str(), &rates);

            let summary = sweep.run(&predicate, span, &mut [&mut counts, &mut totals])?;
            let c = counts.counts();

            println!("{} to {} ({} days)", summary.span.start, summary.span.end, summary.days);
            println!(
                "operations: {} (income {}, expense {}, transfer {}, adjustment {}, returns {})",
                c.all, c.income, c.expense, c.transfer, c.adjustment, c.returns
            );
            println!(
                "income:  {:>14.2} {}",
                round_to_fixed(totals.income().running(), 2),
                global.currency
            );
            println!(
                "expense: {:>14.2} {}",
                round_to_fixed(totals.expense().running(), 2),
                global.currency
            );
        }

        Reporter::Accounts { .. } => {
            // deleted accounts still carry historical operations
            let mut balances = AccountsReducer::new(&data.accounts, global.currency.as_str(), today, &rates);

            sweep.run(&predicate, span, &mut [&mut balances])?;

            if let Some(monthly) = balances.master(Granularity::Month) {
                print_series(&format!("all accounts ({})", global.currency), monthly);
            }
        }

        Reporter::Compare { .. } => {
            let mut monthly = MonthlyComparison::new(global.currency.as_str(), &rates);
            let mut yearly = YearlyComparison::new(global.currency.as_str(), &rates);

            sweep.run(&predicate, span, &mut [&mut monthly, &mut yearly])?;

            for (month, years) in monthly.months() {
                let cells = years
                    .iter()
                    .map(|(year, amount)| format!("{}: {:.2}", year, round_to_fixed(*amount, 2)))
                    .collect::<Vec<_>>();
                println!("{:>2}  {}", month, cells.join("  "));
            }

            for (year, amount) in yearly.years() {
                println!("{}  {:>14.2}", year, round_to_fixed(*amount, 2));
            }
        }

        Reporter::Goals { year, .. } => {
            let mut goals = GoalsReducer::new(&data.categories, global.currency.as_str(), &rates);
            let year = year.unwrap_or_else(|| today.year());

            sweep.run(&predicate, span, &mut [&mut goals])?;

            let mut names = goals.categories().collect::<Vec<_>>();
            names.sort_unstable();

            for name in names {
                println!(
                    "{:<20} {:>14.2} {:>6.1}%",
                    name,
                    round_to_fixed(goals.spent(name, year), 2),
                    round_to_fixed(goals.progress(name, year)? * 100.0, 1)
                );
            }
        }
    }

    Ok(())
}
