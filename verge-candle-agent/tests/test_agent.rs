use anyhow::Result;
use std::path::Path;
use tempdir::TempDir;
use verge_candle_agent::{
    agent::{AgentConfig, AgentDescription, AnyAgent},
    ddpg::DdpgConfig,
    sac::SacConfig,
};
use verge_core::{Agent, AgentError};

fn configs() -> Vec<AgentConfig> {
    vec![
        AgentConfig::Ddpg(
            DdpgConfig::new(3, 2)
                .hidden_layers(vec![16, 8])
                .batch_size(4)
                .buffer_size(20),
        ),
        AgentConfig::Sac(
            SacConfig::new(3, 2)
                .hidden_layers(vec![16, 8])
                .batch_size(4)
                .buffer_size(20)
                .alpha_lr(Some(1e-3)),
        ),
    ]
}

fn train(agent: &mut AnyAgent, n: usize) -> Result<()> {
    for i in 0..n {
        let x = (i as f32 * 0.3).sin();
        let state = [x, -x, 0.5 * x];
        let action = agent.act(&state, 0.2)?;
        agent.step(&state, &action, x, &[-x, x, 0.0], i % 4 == 3)?;
    }
    Ok(())
}

fn assert_same(a: &AgentDescription, b: &AgentDescription) -> Result<()> {
    assert_eq!(a.names(), b.names());
    for (name, tensors) in a.iter() {
        let other = b.get(name).unwrap();
        for var in tensors.names() {
            assert_eq!(tensors.to_vec(var)?, other.to_vec(var)?, "{}.{}", name, var);
        }
    }
    Ok(())
}

#[test]
fn test_save_and_load() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new("verge_agent")?;

    for (i, config) in configs().into_iter().enumerate() {
        let path = dir.path().join(format!("agent{}.safetensors", i));
        let mut agent = AnyAgent::build(config.clone())?;
        train(&mut agent, 10)?;
        assert!(agent.last_record().is_some());
        agent.save_state(&path)?;

        let mut other = AnyAgent::build(config)?;
        other.load_state(&path)?;
        assert_same(&agent.describe_agent()?, &other.describe_agent()?)?;
    }
    Ok(())
}

#[test]
fn test_load_missing_file() -> Result<()> {
    let dir = TempDir::new("verge_agent")?;
    let path = dir.path().join("missing.safetensors");

    for config in configs() {
        let mut agent = AnyAgent::build(config)?;
        let before = agent.describe_agent()?;
        let err = agent.load_state(&path).err().unwrap();
        assert_eq!(
            err.downcast_ref::<AgentError>(),
            Some(&AgentError::StateFileNotFound(path.clone()))
        );
        assert_same(&before, &agent.describe_agent()?)?;
    }
    Ok(())
}

#[test]
fn test_load_other_agent_fails() -> Result<()> {
    let dir = TempDir::new("verge_agent")?;
    let path = dir.path().join("ddpg.safetensors");
    let configs = configs();
    AnyAgent::build(configs[0].clone())?.save_state(&path)?;

    let mut sac = AnyAgent::build(configs[1].clone())?;
    let before = sac.describe_agent()?;
    assert!(matches!(
        sac.load_state(Path::new(&path)).err().unwrap().downcast_ref::<AgentError>(),
        Some(AgentError::MissingParameter(_))
    ));
    assert_same(&before, &sac.describe_agent()?)?;
    Ok(())
}

#[test]
fn test_invalid_configs() {
    let invalid = vec![
        AgentConfig::Ddpg(DdpgConfig::new(3, 1).tau(0.0)),
        AgentConfig::Ddpg(DdpgConfig::new(3, 1).tau(1.5)),
        AgentConfig::Ddpg(DdpgConfig::new(3, 1).critic_lr(-1e-3)),
        AgentConfig::Ddpg(DdpgConfig::new(3, 1).clip(1.0, 1.0)),
        AgentConfig::Ddpg(DdpgConfig::new(3, 1).hidden_layers(vec![])),
        AgentConfig::Sac(SacConfig::new(3, 1).gamma(1.5)),
        AgentConfig::Sac(SacConfig::new(3, 1).actor_lr(f64::NAN)),
        AgentConfig::Sac(SacConfig::new(3, 1).batch_size(0)),
    ];
    for config in invalid {
        let err = AnyAgent::build(config.clone()).err().unwrap();
        assert!(
            matches!(
                err.downcast_ref::<AgentError>(),
                Some(AgentError::Configuration(_))
            ),
            "{:?}",
            config
        );
    }
}

#[test]
fn test_dispatch() -> Result<()> {
    for config in configs() {
        let mut agent = AnyAgent::build(config)?;
        let action = agent.act(&[0.1, 0.2, 0.3], 0.0)?;
        assert_eq!(action.len(), 2);
        assert!(agent.act(&[0.1, 0.2], 0.0).is_err());

        train(&mut agent, 5)?;
        let record = agent.last_record().unwrap();
        assert!(record.get_scalar("loss_critic")?.is_finite());
        assert!(record.get_scalar("loss_actor")?.is_finite());
        agent.reset_agent()?;
    }
    Ok(())
}
