use clap::Parser;
use eetlijst::Eetlijst;

#[derive(Parser)]
#[command(
    name = "session",
    about = "Print the list name reachable with an existing session id"
)]
struct Args {
    session_id: String,
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    let client = Eetlijst::from_session_id(args.session_id.as_str());

    if !client.is_valid() {
        eprintln!("Session id is probably expired or invalid.");
        std::process::exit(1);
    }

    match client.get_list_name() {
        Ok(name) => println!("Session id belongs to list with name '{name}'."),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
