//! End-to-end tests over a real TCP listener.

use std::sync::Arc;
use std::time::Duration;

use reefpi::api;
use reefpi::config::ServerConfig;
use reefpi::controller::drivers::Level;
use reefpi::controller::{
    ChannelLayout, Controller, HardwareCapabilities, HardwareController, LifecycleState,
    SimulatedBoard,
};
use reefpi::lifecycle::{Exit, Shutdown, Supervisor};
use reefpi::net::{Launcher, ListenerError, TcpLauncher};
use serde_json::{json, Value};

mod common;

use common::{cli, config_file, free_port, wait_until_ready};

#[tokio::test]
async fn serves_api_until_interrupted() {
    let port = free_port();
    let file = config_file("interface = \"127.0.0.1\"\napi_tokens = [\"reef-secret\"]\n");
    let board = SimulatedBoard::new();
    board.set_adc_value(1, 700);

    let port_arg = port.to_string();
    let mut supervisor = Supervisor::new(
        cli(&[
            "-config",
            file.path().to_str().unwrap(),
            "-port",
            &port_arg,
            "-adc",
        ]),
        Arc::new(board.clone()),
        TcpLauncher,
    );

    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let exit = supervisor
        .run(
            async {
                wait_until_ready(&client, &format!("{base}/api/health")).await;

                let res = client
                    .get(format!("{base}/api/relays/0"))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(res.status(), 401);

                let res = client
                    .post(format!("{base}/api/relays/2"))
                    .bearer_auth("reef-secret")
                    .json(&json!({ "on": true }))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(res.status(), 200);
                assert_eq!(board.pin_level(2), Some(Level::Low));

                let body: Value = client
                    .get(format!("{base}/api/relays/2"))
                    .bearer_auth("reef-secret")
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
                assert_eq!(body, json!({ "channel": 2, "on": true }));

                let body: Value = client
                    .get(format!("{base}/api/adc/1"))
                    .bearer_auth("reef-secret")
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
                assert_eq!(body["value"], 700);

                let res = client
                    .post(format!("{base}/api/pwm/0"))
                    .bearer_auth("reef-secret")
                    .json(&json!({ "duty": 40 }))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(res.status(), 409);
            },
            &mut Vec::new(),
        )
        .await
        .unwrap();

    assert_eq!(exit, Exit::Interrupted);
    assert_eq!(supervisor.controller().unwrap().state(), LifecycleState::Stopped);
    assert_eq!(board.pin_level(2), Some(Level::High));

    let listener = supervisor.take_listener().unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .expect("listener did not stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn occupied_port_is_reported_by_listener_only() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port().to_string();
    let file = config_file("interface = \"127.0.0.1\"\n");

    let mut supervisor = Supervisor::new(
        cli(&["-config", file.path().to_str().unwrap(), "-port", &port, "-no-auth"]),
        Arc::new(SimulatedBoard::new()),
        TcpLauncher,
    );

    let exit = supervisor
        .run(tokio::time::sleep(Duration::from_millis(100)), &mut Vec::new())
        .await
        .unwrap();
    assert_eq!(exit, Exit::Interrupted);

    let result = supervisor.take_listener().unwrap().await.unwrap();
    assert!(matches!(result, Err(ListenerError::Bind { .. })));
}

#[tokio::test]
async fn handlers_fail_once_controller_stopped() {
    let port = free_port();
    let controller = Arc::new(HardwareController::new(
        HardwareCapabilities::default(),
        Arc::new(SimulatedBoard::new()),
        ChannelLayout::default(),
    ));
    controller.start().unwrap();

    let config = ServerConfig {
        interface: "127.0.0.1".into(),
        port,
        ..ServerConfig::default()
    };
    let service = api::bind(config, controller.clone(), false).unwrap();

    let shutdown = Shutdown::new();
    let listener = TcpLauncher.launch(service, shutdown.subscribe());

    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    wait_until_ready(&client, &format!("{base}/api/health")).await;

    let res = client.get(format!("{base}/api/relays/0")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    controller.stop().unwrap();

    let res = client.get(format!("{base}/api/relays/0")).send().await.unwrap();
    assert_eq!(res.status(), 503);

    let body: Value = client
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["controller"], "stopped");

    shutdown.trigger();
    assert!(listener.await.unwrap().is_ok());
}
