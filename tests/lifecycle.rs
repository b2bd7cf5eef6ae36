//! Connection lifecycle: idle timeouts, QUIT, admission cap, nickname
//! release on teardown.

mod common;

use common::{TestClient, spawn_relay};
use relayd::config::Config;
use std::time::Duration;

/// Short timeouts so the tests run quickly.
fn quick_config() -> Config {
    Config {
        unregistered_timeout: Duration::from_millis(400),
        registered_timeout: Duration::from_secs(3),
        ..Config::default()
    }
}

#[tokio::test]
async fn unregistered_session_times_out() -> anyhow::Result<()> {
    let (addr, _relay) = spawn_relay(quick_config()).await?;
    let mut client = TestClient::connect(addr).await?;
    client.expect_greeting().await?;

    // Send nothing; the short unregistered timeout applies.
    let notice = client.recv_timeout(Duration::from_secs(2)).await?;
    assert_eq!(notice, "ERROR :Closing Link: Connection timed out length=0");
    client.expect_closed(Duration::from_secs(2)).await?;
    Ok(())
}

#[tokio::test]
async fn registered_session_outlives_unregistered_timeout() -> anyhow::Result<()> {
    let (addr, _relay) = spawn_relay(quick_config()).await?;
    let mut client = TestClient::connect(addr).await?;
    client.expect_greeting().await?;
    client.register("alice").await?;

    // Well past the unregistered timeout, still connected.
    tokio::time::sleep(Duration::from_millis(800)).await;
    client.send("QUIT").await?;
    let notice = client.recv().await?;
    assert_eq!(notice, "ERROR :Closing Link: Connection timed out (bye bye)");
    Ok(())
}

#[tokio::test]
async fn registered_session_times_out_eventually() -> anyhow::Result<()> {
    let (addr, _relay) = spawn_relay(Config {
        unregistered_timeout: Duration::from_millis(400),
        registered_timeout: Duration::from_millis(900),
        ..Config::default()
    })
    .await?;
    let mut client = TestClient::connect(addr).await?;
    client.expect_greeting().await?;
    client.register("alice").await?;

    let notice = client.recv_timeout(Duration::from_secs(3)).await?;
    assert_eq!(notice, "ERROR :Closing Link: Connection timed out length=0");
    Ok(())
}

#[tokio::test]
async fn byte_trickle_keeps_session_alive() -> anyhow::Result<()> {
    let (addr, _relay) = spawn_relay(Config {
        unregistered_timeout: Duration::from_millis(600),
        ..Config::default()
    })
    .await?;
    let mut client = TestClient::connect(addr).await?;
    client.expect_greeting().await?;

    // One byte at a time: each gap is well under the timeout, but the
    // whole line takes much longer than it. The idle clock resets on
    // byte arrival, so the session must survive to registration.
    for b in "NICK alice".bytes() {
        client.send_bytes(&[b]).await?;
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
    client.send_bytes(b"\n").await?;
    client.send("USER alice").await?;
    let welcome = client.recv_until(|l| l.contains(" 255 ")).await?;
    assert_eq!(welcome[0], ":ircserver.com 001 alice : Gday");
    Ok(())
}

#[tokio::test]
async fn quit_closes_connection_and_frees_counter() -> anyhow::Result<()> {
    let (addr, relay) = spawn_relay(Config::default()).await?;
    let mut client = TestClient::connect(addr).await?;
    client.expect_greeting().await?;
    assert_eq!(relay.connections_open(), 1);

    client.send("QUIT").await?;
    let notice = client.recv().await?;
    assert_eq!(notice, "ERROR :Closing Link: Connection timed out (bye bye)");
    client.expect_closed(Duration::from_secs(2)).await?;

    // Counter decrements once the task tears down.
    for _ in 0..50 {
        if relay.connections_open() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(relay.connections_open(), 0);
    Ok(())
}

#[tokio::test]
async fn admission_refused_over_limit() -> anyhow::Result<()> {
    let (addr, relay) = spawn_relay(Config {
        max_clients: 1,
        ..Config::default()
    })
    .await?;

    let mut first = TestClient::connect(addr).await?;
    first.expect_greeting().await?;

    let mut second = TestClient::connect(addr).await?;
    let notice = second.recv().await?;
    assert_eq!(notice, "ERROR :Closing Link: Client count too great");
    second.expect_closed(Duration::from_secs(2)).await?;

    // The refused connection releases its slot.
    for _ in 0..50 {
        if relay.connections_open() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(relay.connections_open(), 1);
    Ok(())
}

#[tokio::test]
async fn nickname_released_on_disconnect() -> anyhow::Result<()> {
    let (addr, _relay) = spawn_relay(Config::default()).await?;

    let mut first = TestClient::connect(addr).await?;
    first.expect_greeting().await?;
    first.register("alice").await?;
    first.send("QUIT").await?;
    first.recv().await?;
    first.expect_closed(Duration::from_secs(2)).await?;

    // Give the server task a moment to tear down and release the claim.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut second = TestClient::connect(addr).await?;
    second.expect_greeting().await?;
    let welcome = second.register("alice").await?;
    assert_eq!(welcome[0], ":ircserver.com 001 alice : Gday");
    Ok(())
}

#[tokio::test]
async fn oversized_line_truncated_session_survives() -> anyhow::Result<()> {
    let (addr, _relay) = spawn_relay(Config::default()).await?;
    let mut client = TestClient::connect(addr).await?;
    client.expect_greeting().await?;

    // 4000 bytes with no terminator, then a terminator and a real command.
    let flood = "x".repeat(4000);
    client.send(&format!("{flood}\nNICK alice")).await?;
    client.send("USER alice").await?;
    let welcome = client.recv_until(|l| l.contains(" 255 ")).await?;
    assert_eq!(welcome[0], ":ircserver.com 001 alice : Gday");
    Ok(())
}
