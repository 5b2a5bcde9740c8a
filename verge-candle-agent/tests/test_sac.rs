use anyhow::Result;
use verge_candle_agent::sac::{Sac, SacConfig};
use verge_core::{Agent, AgentError};

const STATE_DIM: usize = 4;
const ACTION_DIM: usize = 2;
const BATCH_SIZE: usize = 8;

fn config() -> SacConfig {
    SacConfig::new(STATE_DIM, ACTION_DIM)
        .hidden_layers(vec![32, 32])
        .batch_size(BATCH_SIZE)
        .buffer_size(100)
}

fn run(agent: &mut Sac, n: usize) -> Result<()> {
    let mut state = vec![0.1f32, -0.2, 0.3, 0.0];
    for i in 0..n {
        let action = agent.act(&state, 0.1)?;
        let next_state: Vec<f32> = state.iter().zip(action.iter().cycle()).map(|(s, a)| 0.9 * s + 0.1 * a).collect();
        let reward = -next_state.iter().map(|x| x * x).sum::<f32>();
        Agent::step(agent, &state, &action, reward, &next_state, i % 10 == 9)?;
        state = next_state;
    }
    Ok(())
}

#[test]
fn test_sac_alpha_frozen_without_alpha_lr() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut sac = Sac::build(config().alpha(0.2).alpha_lr(None))?;
    let alpha = sac.alpha()?;
    run(&mut sac, 30)?;
    assert!(sac.n_opts() > 0);
    assert_eq!(sac.alpha()?, alpha);
    assert!(sac.last_record().unwrap().get("loss_alpha").is_none());
    Ok(())
}

#[test]
fn test_sac_alpha_tuned_with_alpha_lr() -> Result<()> {
    let mut sac = Sac::build(config().alpha(0.2).alpha_lr(Some(1e-2)))?;
    let alpha = sac.alpha()?;
    run(&mut sac, 30)?;
    assert_ne!(sac.alpha()?, alpha);

    let record = sac.last_record().unwrap();
    assert_eq!(record.get_scalar("alpha")?, sac.alpha()?);
    let std = record.get_array1("policy_std")?;
    assert_eq!(std.len(), ACTION_DIM);
    assert!(std.iter().all(|&s| s > 0.0));
    Ok(())
}

#[test]
fn test_sac_warm_up_and_update_freq() -> Result<()> {
    let mut sac = Sac::build(config().warm_up(12).update_freq(3).number_updates(2))?;
    run(&mut sac, 11)?;
    assert_eq!(sac.n_opts(), 0);
    // Steps 12 and 15 trigger two updates each.
    run(&mut sac, 4)?;
    assert_eq!(sac.iteration(), 15);
    assert_eq!(sac.n_opts(), 4);
    Ok(())
}

#[test]
fn test_sac_actions_are_clamped() -> Result<()> {
    let mut sac = Sac::build(config().action_scale(100.0).init_std(10.0))?;
    for epsilon in [0.0, 0.5, 1.0].iter() {
        for _ in 0..20 {
            for a in sac.act_with(&[0.5; STATE_DIM], *epsilon, false)? {
                assert!((-1.0..=1.0).contains(&a), "{}", a);
            }
        }
    }
    Ok(())
}

#[test]
fn test_sac_learn_without_data() -> Result<()> {
    let mut sac = Sac::build(config())?;
    assert!(matches!(
        sac.learn_from_buffer().err().unwrap().downcast_ref::<AgentError>(),
        Some(AgentError::InsufficientData { len: 0, .. })
    ));
    Ok(())
}
