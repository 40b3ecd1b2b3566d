use clap::Parser;
use dataflex::cli::commands::agent::AgentCommands;
use dataflex::cli::commands::commission::CommissionCommands;
use dataflex::cli::commands::withdraw::WithdrawCommands;
use dataflex::cli::{Cli, Commands};
use dataflex::domain::models::SourceType;

#[test]
fn test_parse_agent_add_with_legacy() {
    let cli = Cli::try_parse_from([
        "dataflex",
        "agent",
        "add",
        "Akua Boateng",
        "+233 24 123 4567",
        "--legacy-commissions",
        "15.5",
    ])
    .unwrap();

    match cli.command {
        Commands::Agent(args) => match args.command {
            AgentCommands::Add {
                name,
                phone,
                legacy_commissions,
                legacy_paid_out,
            } => {
                assert_eq!(name, "Akua Boateng");
                assert_eq!(phone, "+233 24 123 4567");
                assert_eq!(legacy_commissions, Some(15.5));
                assert_eq!(legacy_paid_out, None);
            }
            other => panic!("Wrong agent command: {other:?}"),
        },
        other => panic!("Wrong top-level command: {other:?}"),
    }
    assert!(!cli.json);
}

#[test]
fn test_parse_commission_record() {
    let cli = Cli::try_parse_from([
        "dataflex",
        "--json",
        "commission",
        "record",
        "0241234567",
        "--source-type",
        "wholesale_order",
        "--source-id",
        "WO-881",
        "--amount",
        "0.35",
        "--pending",
    ])
    .unwrap();

    assert!(cli.json);
    match cli.command {
        Commands::Commission(args) => match args.command {
            CommissionCommands::Record {
                agent,
                source_type,
                source_id,
                amount,
                pending,
            } => {
                assert_eq!(agent, "0241234567");
                assert_eq!(source_type, SourceType::WholesaleOrder);
                assert_eq!(source_id, "WO-881");
                assert!((amount - 0.35).abs() < f64::EPSILON);
                assert!(pending);
            }
            other => panic!("Wrong commission command: {other:?}"),
        },
        other => panic!("Wrong top-level command: {other:?}"),
    }
}

#[test]
fn test_parse_commission_check_negative_amount() {
    let cli = Cli::try_parse_from(["dataflex", "commission", "check", "-0.5"]).unwrap();
    match cli.command {
        Commands::Commission(args) => {
            assert!(matches!(args.command, CommissionCommands::Check { amount } if amount < 0.0));
        }
        other => panic!("Wrong top-level command: {other:?}"),
    }
}

#[test]
fn test_parse_rejects_unknown_source_type() {
    let result = Cli::try_parse_from([
        "dataflex",
        "commission",
        "record",
        "abc",
        "--source-type",
        "bonus",
        "--source-id",
        "x",
        "--amount",
        "0.1",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_parse_withdraw_and_dashboard() {
    let cli = Cli::try_parse_from(["dataflex", "withdraw", "complete", "3f2a"]).unwrap();
    match cli.command {
        Commands::Withdraw(args) => {
            assert!(matches!(args.command, WithdrawCommands::Complete { ref id } if id == "3f2a"));
        }
        other => panic!("Wrong top-level command: {other:?}"),
    }

    let cli = Cli::try_parse_from(["dataflex", "dashboard"]).unwrap();
    match cli.command {
        Commands::Dashboard(args) => {
            assert_eq!(args.limit, 100);
            assert_eq!(args.offset, 0);
        }
        other => panic!("Wrong top-level command: {other:?}"),
    }
}

#[test]
fn test_cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
