//! decision-sim: headless harness.
//!
//! Plays a seeded automated game (first eligible card each day, choice
//! picked by the seeded RNG), then replays the recorded script twice and
//! checks that every run lands on the same canonical hash.
//!
//! Usage: decision-sim [config.json]

use std::path::Path;
use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use decision_engine::characters::DialogueType;
use decision_runtime::config::SessionConfig;
use decision_runtime::deck::bundled_roster;
use decision_runtime::drift;
use decision_runtime::replay::{self, ScriptedDecision};
use decision_runtime::session::Session;

const GUEST_CHARACTER: &str = "IGUANA_KING";

fn main() -> ExitCode {
    init_tracing();

    let mut config = match std::env::args().nth(1) {
        Some(path) => match SessionConfig::from_file(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "cannot load config");
                return ExitCode::FAILURE;
            }
        },
        None => SessionConfig::default(),
    };
    let seed = *config.seed.get_or_insert_with(rand::random);

    let deck = match config.load_deck() {
        Ok(deck) => deck,
        Err(e) => {
            error!(error = %e, "cannot load deck");
            return ExitCode::FAILURE;
        }
    };
    let roster = match bundled_roster() {
        Ok(roster) => roster,
        Err(e) => {
            error!(error = %e, "cannot load characters");
            return ExitCode::FAILURE;
        }
    };

    let max_days = config.max_days;
    let mut session = Session::with_parts(config, deck, roster);
    let mut rng = StdRng::seed_from_u64(seed);
    info!(seed, max_days, "harness started");

    if session.roster_mut().enter_scene(GUEST_CHARACTER) {
        if let Some(guest) = session.roster().get(GUEST_CHARACTER) {
            info!(line = %guest.dialogue(DialogueType::Greeting, &mut rng), "guest arrives");
        }
    }

    let script = play(&mut session, &mut rng, max_days);
    let live_hash = session.current_hash();
    let live_state = session.state().clone();
    let (ending, stats) = session.finish();

    let replayed_hash = match drift::verify_determinism(session.deck(), seed, &script) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "replay verification failed");
            return ExitCode::FAILURE;
        }
    };
    if replayed_hash != live_hash {
        if let Ok(outcome) = replay::run_script(session.deck(), seed, &script) {
            let report = drift::compare_states(&live_state, &outcome.state);
            error!(?report, "replay diverged from live session");
        }
        println!("DETERMINISM FAILURE");
        println!("  Live:   {}", live_hash);
        println!("  Replay: {}", replayed_hash);
        return ExitCode::FAILURE;
    }

    println!("===========================================");
    println!("Seed:       {}", seed);
    println!("Ending:     {:?}", ending);
    println!("Days:       {}", stats.days_in_office);
    println!("Decisions:  {}", stats.total_decisions);
    println!("Popularity: {}", stats.final_popularity);
    println!("Stability:  {}", stats.final_stability);
    println!("Score:      {}", stats.overall_score);
    println!("Hash:       {}", live_hash);
    for line in session.engine().consequences().recent_headlines(5) {
        println!("  > {}", line);
    }
    ExitCode::SUCCESS
}

/// One decision per day until `max_days` pass, the game falls, or no card
/// is eligible even after a reshuffle. Returns the script that was played.
fn play(session: &mut Session, rng: &mut StdRng, max_days: u32) -> Vec<ScriptedDecision> {
    let mut script = Vec::new();

    for _ in 0..max_days {
        let mut pick = first_eligible(session, rng);
        if pick.is_none() {
            session.reshuffle();
            pick = first_eligible(session, rng);
        }
        let Some((card_id, choice_id)) = pick else {
            warn!(day = session.state().current_day(), "no eligible cards left");
            break;
        };

        if let Err(e) = session.resolve(&card_id, choice_id) {
            warn!(card_id = %card_id, choice_id, error = %e, "decision rejected");
            break;
        }
        script.push(ScriptedDecision::new(&card_id, choice_id, true));

        if session.end_day() {
            break;
        }
    }
    script
}

fn first_eligible(session: &Session, rng: &mut StdRng) -> Option<(String, u32)> {
    let cards = session.eligible_cards();
    let card = cards.first()?;
    let choice = &card.choices[rng.gen_range(0..card.choices.len())];
    Some((card.id.clone(), choice.choice_id))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
