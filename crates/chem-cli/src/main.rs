//! CLI de operador sobre los mismos endpoints del servicio.
//!
//! ```text
//! molcalc-cli submit <archivo.sdf> [--no-hydrogens] [--client <IP>]
//! molcalc-cli show <HASHKEY>
//! molcalc-cli sdf2smiles <archivo.sdf>
//! molcalc-cli smiles2sdf <SMILES>
//! ```

use log::error;
use molcalc_rust::{AppConfig, AppState, Form, Response};

const USAGE: &str = "Uso: molcalc-cli submit <archivo.sdf> [--no-hydrogens] [--client <IP>] | show <HASHKEY> | \
                     sdf2smiles <archivo.sdf> | smiles2sdf <SMILES>";

#[derive(Debug, PartialEq)]
enum Command {
    Submit { path: String, add_hydrogens: bool, client: String },
    Show { key: String },
    SdfToSmiles { path: String },
    SmilesToSdf { smiles: String },
}

fn parse_args(args: &[String]) -> Option<Command> {
    let command = args.get(1)?.as_str();
    let target = args.get(2)?.clone();
    match command {
        "submit" => {
            let mut add_hydrogens = true;
            let mut client = "127.0.0.1".to_string();
            let mut i = 3;
            while i < args.len() {
                match args[i].as_str() {
                    "--no-hydrogens" => add_hydrogens = false,
                    "--client" => {
                        i += 1;
                        client = args.get(i)?.clone();
                    }
                    _ => return None,
                }
                i += 1;
            }
            Some(Command::Submit { path: target,
                                   add_hydrogens,
                                   client })
        }
        "show" => Some(Command::Show { key: target }),
        "sdf2smiles" => Some(Command::SdfToSmiles { path: target }),
        "smiles2sdf" => Some(Command::SmilesToSdf { smiles: target }),
        _ => None,
    }
}

fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("[molcalc-cli] no se pudo leer {path}: {e}");
            std::process::exit(2);
        }
    }
}

fn form(pairs: &[(&str, String)]) -> Form {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = parse_args(&args) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let state = match AppConfig::from_env().and_then(|cfg| AppState::from_config(&cfg)) {
        Ok(s) => s,
        Err(e) => {
            error!("startup failed: {e}");
            std::process::exit(5);
        }
    };

    let response: Response = match command {
        Command::Submit { path,
                          add_hydrogens,
                          client } => {
            let flag = if add_hydrogens { "1" } else { "0" };
            let form = form(&[("sdf", read_file(&path)), ("add_hydrogens", flag.to_string())]);
            state.submit_quantum(&form, &client).await
        }
        Command::Show { key } => state.view_calculation(&key).await,
        Command::SdfToSmiles { path } => state.sdf_to_smiles(&form(&[("sdf", read_file(&path))])).await,
        Command::SmilesToSdf { smiles } => state.smiles_to_sdf(&form(&[("smiles", smiles)])).await,
    };

    match serde_json::to_string_pretty(&response.body) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("[molcalc-cli] {e}");
            std::process::exit(5);
        }
    }
    let failed = response.status != 200 || response.body.get("error").is_some();
    std::process::exit(if failed { 4 } else { 0 });
}
