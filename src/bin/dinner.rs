use clap::{Parser, Subcommand, ValueEnum};
use eetlijst::{DinnerStatus, Eetlijst};

#[derive(Parser)]
#[command(name = "dinner", about = "Get or set today's dinner status")]
struct Args {
    username: String,
    password: String,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Print today's dinner grid.
    Get,
    /// Set a resident's status for today.
    Set {
        /// Grid column of the resident to update (0-based).
        resident: usize,
        status: StatusArg,
        /// Number of guests brought along.
        #[arg(long, default_value_t = 0)]
        guests: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    No,
    Dinner,
    Cook,
    Unknown,
}

impl StatusArg {
    fn into_status(self, guests: u32) -> DinnerStatus {
        match self {
            Self::No => DinnerStatus::No,
            Self::Dinner => DinnerStatus::Dinner { guests },
            Self::Cook => DinnerStatus::Cook { guests },
            Self::Unknown => DinnerStatus::Unknown,
        }
    }
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> eetlijst::Result<()> {
    let client = Eetlijst::login(&args.username, &args.password)?;

    match args.action {
        Action::Get => {
            let residents = client.get_residents()?;
            let rows = client.get_dinner_status(Some(1))?;
            let Some(row) = rows.first() else {
                eprintln!("The list has no status rows.");
                std::process::exit(1);
            };

            println!("Dinner status for {}:", row.date());
            for resident in &residents {
                println!(
                    "  {:<16} {}",
                    resident.name(),
                    row.statuses()[resident.ordinal()].status()
                );
            }
            println!("Total attending: {}", row.attendee_count());
            if row.has_deadline_passed() {
                println!("The deadline has passed.");
            }
        }
        Action::Set {
            resident,
            status,
            guests,
        } => {
            let rows = client.get_dinner_status(Some(1))?;
            let Some(row) = rows.first() else {
                eprintln!("The list has no status rows.");
                std::process::exit(1);
            };

            client.set_dinner_status(row.date(), resident, status.into_status(guests))?;
            println!("Status updated.");
        }
    }

    Ok(())
}
