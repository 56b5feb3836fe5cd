use clap::Parser;
use leadcmd::cli::{
    print_error, run_activity, run_add, run_business_search, run_config, run_delete, run_export,
    run_import, run_link, run_list, run_show, run_stats, run_team, run_unlink, run_update,
    BusinessCommand, Cli, Commands,
};
use leadcmd::config::Config;
use leadcmd::db::Database;
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LEADCMD_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        print_error(&e, json);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let db = Database::open()?;
    let config = Config::load(&db)?;
    let json = cli.json;

    match cli.command {
        Commands::List(args) => run_list(&db, &config, &args, json)?,
        Commands::Stats => run_stats(&db, &config, json)?,
        Commands::Show(args) => run_show(&db, args.id, json)?,
        Commands::Add(args) => run_add(&db, &config, args, json)?,
        Commands::Update(args) => run_update(&db, &config, args, json)?,
        Commands::Delete(args) => run_delete(&db, args.id, args.yes, json)?,
        Commands::Activity(args) => run_activity(&db, &config, args, json)?,
        Commands::Business(BusinessCommand::Search(args)) => {
            run_business_search(&db, &config, args, json)?
        }
        Commands::Link(args) => run_link(&db, args.id, args.business, json)?,
        Commands::Unlink(args) => run_unlink(&db, args.id, json)?,
        Commands::Team => run_team(&db, json)?,
        Commands::Import(args) => run_import(&db, &args.file, args.dry_run, json)?,
        Commands::Export(args) => run_export(&db, &args)?,
        Commands::Config(command) => run_config(&db, command, json)?,
    }

    Ok(())
}
