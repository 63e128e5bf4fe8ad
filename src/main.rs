//! Headless episode runner
//!
//! Drives the simulator from the command line, optionally delegating every
//! decision to a remote agent over TCP. Without an agent the runner idles
//! and accepts the first card whenever an upgrade offer appears.

use std::process::ExitCode;

use overrun::agent::AgentClient;
use overrun::env::Env;
use overrun::sim::{Action, PlayState, build_observation};

struct RunOptions {
    seed: u64,
    max_steps: u64,
    agent_addr: Option<String>,
}

fn print_usage() {
    println!("Usage: overrun [--seed N] [--max-steps N] [--agent HOST:PORT]");
}

fn parse_args() -> Result<RunOptions, String> {
    let mut opts = RunOptions {
        seed: 1337,
        max_steps: 36_000,
        agent_addr: None,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                opts.seed = value.parse().map_err(|e| format!("invalid --seed: {e}"))?;
            }
            "--max-steps" => {
                let value = args.next().ok_or("--max-steps needs a value")?;
                opts.max_steps = value
                    .parse()
                    .map_err(|e| format!("invalid --max-steps: {e}"))?;
            }
            "--agent" => {
                opts.agent_addr = Some(args.next().ok_or("--agent needs HOST:PORT")?);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    if opts.max_steps == 0 {
        return Err("--max-steps must be >= 1".into());
    }
    Ok(opts)
}

fn main() -> ExitCode {
    env_logger::init();

    let opts = match parse_args() {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("{msg}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    let mut agent = None;
    if let Some(addr) = &opts.agent_addr {
        let connected = AgentClient::connect(addr).and_then(|mut client| {
            let model = client.handshake()?;
            Ok((client, model))
        });
        match connected {
            Ok((client, model)) => {
                log::info!("connected to agent at {addr}, model={model}");
                agent = Some(client);
            }
            Err(err) => {
                eprintln!("failed to reach agent at {addr}: {err}");
                return ExitCode::from(2);
            }
        }
    }

    let mut env = Env::new(opts.seed);
    log::info!("running seed={} for up to {} steps", opts.seed, opts.max_steps);

    for _ in 0..opts.max_steps {
        let choosing = env.state().play_state == PlayState::ChoosingUpgrade;
        let action = if let Some(client) = agent.as_mut() {
            let obs = build_observation(env.state());
            match client.infer(&obs, choosing) {
                Ok(action) => action,
                Err(err) => {
                    eprintln!("agent inference failed: {err}");
                    return ExitCode::from(2);
                }
            }
        } else if choosing {
            Action {
                upgrade_choice: 0,
                ..Action::default()
            }
        } else {
            Action::default()
        };

        let result = env.step(&action);
        if result.terminated || result.truncated {
            break;
        }
    }

    let state = env.state();
    let accuracy = if state.stats.shots_fired > 0 {
        state.stats.shots_hit as f32 / state.stats.shots_fired as f32
    } else {
        0.0
    };
    println!(
        "seed={} ticks={} kills={} accuracy={:.2} dead={}",
        state.seed,
        state.tick,
        state.stats.kills,
        accuracy,
        u8::from(state.play_state == PlayState::Dead)
    );
    ExitCode::SUCCESS
}
