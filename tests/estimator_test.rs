// Estimator convergence gate and session opening against a recording link

mod common;

use std::time::Duration;

use common::{converged, noisy, Command, RecordingLink};
use crazyflie_pilot::config::EstimatorConfig;
use crazyflie_pilot::subsystems::estimator::wait_for_position_estimator;
use crazyflie_pilot::{Config, Drone, Error, Pose};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn converges_after_a_full_window() -> Result<(), Box<dyn std::error::Error>> {
    let link = RecordingLink::converging();
    let config = EstimatorConfig::default();
    let start = Instant::now();

    let samples = wait_for_position_estimator(&link, &config).await?;

    assert_eq!(samples, 10);
    assert_eq!(start.elapsed(), Duration::from_millis(5000));
    assert_eq!(
        link.commands(),
        vec![Command::OpenStream(Duration::from_millis(500)), Command::StopStream]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn noisy_samples_delay_convergence() -> Result<(), Box<dyn std::error::Error>> {
    let link = RecordingLink::with_samples((0..5).map(noisy).collect(), Some(converged()));
    let config = EstimatorConfig::default();

    let samples = wait_for_position_estimator(&link, &config).await?;

    assert_eq!(samples, 15);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_the_timeout() {
    let link = RecordingLink::with_samples((0..1000).map(noisy).collect(), None);
    let config = EstimatorConfig {
        timeout_ms: Some(3000),
        ..EstimatorConfig::default()
    };

    let result = wait_for_position_estimator(&link, &config).await;

    assert!(matches!(result, Err(Error::EstimatorTimeout(limit)) if limit == Duration::from_secs(3)));
    assert_eq!(link.commands().last(), Some(&Command::StopStream));
}

#[tokio::test(start_paused = true)]
async fn stream_errors_are_returned() {
    let link = RecordingLink::with_samples(vec![converged(); 3], None);
    let config = EstimatorConfig::default();

    let result = wait_for_position_estimator(&link, &config).await;

    assert!(matches!(result, Err(Error::Disconnected)));
    assert_eq!(link.commands().last(), Some(&Command::StopStream));
}

#[tokio::test(start_paused = true)]
async fn custom_window_and_period() -> Result<(), Box<dyn std::error::Error>> {
    let link = RecordingLink::converging();
    let config = EstimatorConfig {
        period_ms: 100,
        window: 3,
        ..EstimatorConfig::default()
    };

    let samples = wait_for_position_estimator(&link, &config).await?;

    assert_eq!(samples, 3);
    assert_eq!(link.commands()[0], Command::OpenStream(Duration::from_millis(100)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn connect_sets_initial_position_and_resets_estimator() -> Result<(), Box<dyn std::error::Error>> {
    let link = RecordingLink::converging();
    let pose = Pose::new(1.0, -0.5, 0.25, 90.0);

    let drone = Drone::connect(link.clone(), pose, &Config::default()).await?;

    assert_eq!(drone.initial_pose(), pose);

    let commands = link.timed_commands();
    let params: Vec<Command> = commands.iter().take(6).map(|(_, c)| c.clone()).collect();
    assert_eq!(
        params,
        vec![
            Command::Param("kalman.initialX".to_owned(), 1.0),
            Command::Param("kalman.initialY".to_owned(), -0.5),
            Command::Param("kalman.initialZ".to_owned(), 0.25),
            Command::Param("kalman.initialYaw".to_owned(), 90f32.to_radians() as f64),
            Command::Param("kalman.resetEstimation".to_owned(), 1.0),
            Command::Param("kalman.resetEstimation".to_owned(), 0.0),
        ]
    );

    // The estimator is held in reset for 100ms
    assert_eq!(commands[5].0 - commands[4].0, Duration::from_millis(100));

    assert_eq!(commands[6].1, Command::OpenStream(Duration::from_millis(500)));
    assert_eq!(commands[7].1, Command::StopStream);
    assert_eq!(commands.len(), 8);
    Ok(())
}
