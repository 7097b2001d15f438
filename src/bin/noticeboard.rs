use clap::{Parser, Subcommand};
use eetlijst::Eetlijst;

#[derive(Parser)]
#[command(name = "noticeboard", about = "Get or set the list's noticeboard")]
struct Args {
    username: String,
    password: String,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Print the noticeboard.
    Get,
    /// Replace the noticeboard wholesale.
    Set { message: String },
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

    match &args.action {
        Action::Get => println!("{}", client.get_noticeboard()?),
        Action::Set { message } => {
            client.set_noticeboard(message)?;
            println!("Noticeboard updated.");
        }
    }

    Ok(())
}
