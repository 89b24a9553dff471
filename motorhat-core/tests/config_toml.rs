//! TOML board configuration parsing

use motorhat_core::config::{HatConfig, StepperConfig};
use motorhat_core::motion::{Command, StepStyle};

#[test]
fn test_full_config() {
    let text = r#"
        address = 0x61
        frequency_hz = 60.0

        [[steppers]]
        steps_per_revolution = 200
        rpm = 30

        [[steppers]]
        steps_per_revolution = 48
        rpm = 120
        coast_on_reverse_microstep = true
    "#;

    let config: HatConfig = toml::from_str(text).unwrap();
    assert_eq!(config.address, 0x61);
    assert_eq!(config.frequency_hz, 60.0);
    assert_eq!(config.steppers[1].steps_per_revolution, 48);
    assert_eq!(config.steppers[1].rpm, 120);
    assert!(config.steppers[1].coast_on_reverse_microstep);
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_config_uses_defaults() {
    let config: HatConfig = toml::from_str("").unwrap();
    assert_eq!(config, HatConfig::default());
}

#[test]
fn test_partial_stepper_entries() {
    let text = r#"
        [[steppers]]
        rpm = 10

        [[steppers]]
    "#;

    let config: HatConfig = toml::from_str(text).unwrap();
    assert_eq!(config.address, 0x60);
    assert_eq!(
        config.steppers[0],
        StepperConfig {
            rpm: 10,
            ..StepperConfig::default()
        }
    );
    assert_eq!(config.steppers[1], StepperConfig::default());
}

#[test]
fn test_single_stepper_entry_defaults_second_port() {
    let text = r#"
        [[steppers]]
        steps_per_revolution = 48
    "#;

    let config: HatConfig = toml::from_str(text).unwrap();
    assert_eq!(config.steppers[0].steps_per_revolution, 48);
    assert_eq!(config.steppers[1], StepperConfig::default());
}

#[test]
fn test_too_many_stepper_entries() {
    let text = r#"
        [[steppers]]
        [[steppers]]
        [[steppers]]
    "#;

    assert!(toml::from_str::<HatConfig>(text).is_err());
}

#[test]
fn test_zero_steps_rejected_by_validate() {
    let text = r#"
        [[steppers]]
        steps_per_revolution = 0
    "#;

    let config: HatConfig = toml::from_str(text).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_command_and_style_names() {
    #[derive(serde::Deserialize)]
    struct Job {
        command: Command,
        style: StepStyle,
    }

    let job: Job = toml::from_str("command = \"Backward\"\nstyle = \"Microstep\"").unwrap();
    assert_eq!(job.command, Command::Backward);
    assert_eq!(job.style, StepStyle::Microstep);
}
