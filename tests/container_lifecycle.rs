// ABOUTME: Live-engine integration tests for the container lifecycle and exec.
// ABOUTME: Skipped when no docker/podman daemon is reachable.

mod support;

use chrono::{Duration, Utc};
use futures::StreamExt;
use skafos::engine::{Container, ContainerError, Engine, Image};
use skafos::types::{ContainerName, ImageRef};

/// Skip the test when no local container engine is reachable.
macro_rules! require_engine {
    () => {
        match support::local_engine().await {
            Some(engine) => engine,
            None => {
                eprintln!("Skipping test: no local container engine found");
                return;
            }
        }
    };
}

/// Image whose container idles until told to stop, so exec has a running
/// target.
const IDLE_DOCKERFILE: &[u8] = b"FROM alpine:latest\nCMD [\"sleep\", \"inf\"]\n";

/// Clock skew allowed between this process and the engine daemon.
fn clock_slack() -> Duration {
    Duration::seconds(60)
}

fn throwaway_container(engine: Engine, reference: &str) -> Container {
    let name = format!("skafos-test-{}", support::unique_suffix());
    let image = Image::with_engine(engine, ImageRef::parse(reference).unwrap());
    Container::new(ContainerName::new(&name).unwrap(), &image)
}

/// Fresh name is absent; create makes it present with a sane creation
/// timestamp; remove makes it absent again.
#[test_group::group(engine)]
#[tokio::test]
async fn container_lifecycle() {
    support::init_tracing();
    let engine = require_engine!();
    let container = throwaway_container(engine, "alpine:latest");

    assert!(
        !container.is_created().await.expect("listing should succeed"),
        "fresh name should not exist"
    );

    let issued_at = Utc::now();
    container.create().await.expect("create should succeed");

    assert!(
        container.is_created().await.expect("listing should succeed"),
        "created name should exist"
    );
    assert!(
        !container.is_started().await.expect("listing should succeed"),
        "create must not start the container"
    );

    let created = container
        .creation_date()
        .await
        .expect("inspect should succeed");
    assert!(
        created >= issued_at - clock_slack(),
        "creation {created} predates the create call {issued_at}"
    );

    container.remove().await.expect("remove should succeed");
    assert!(
        !container.is_created().await.expect("listing should succeed"),
        "removed name should not exist"
    );
}

/// Exec streams merged output from a running container and classifies a
/// failing command, through the full build/create/start/stop cycle.
#[test_group::group(engine)]
#[tokio::test]
async fn exec_streams_output_from_a_running_container() {
    support::init_tracing();
    let engine = require_engine!();

    let tag = format!("idle{}", support::unique_suffix());
    let image = Image::with_engine(engine, ImageRef::new("skafos-test", &tag).unwrap());

    let mut build = image.build(IDLE_DOCKERFILE).expect("build should spawn");
    while build.next_line().await.is_some() {}
    build.finish().await.expect("build should succeed");

    let name = ContainerName::new(&format!("skafos-test-{}", support::unique_suffix())).unwrap();
    let container = Container::new(name, &image);

    container.create().await.expect("create should succeed");
    container.start().await.expect("start should succeed");
    assert!(
        container.is_started().await.expect("listing should succeed"),
        "started container should be running"
    );

    let mut exec = container
        .exec(&["echo", "streamed-by-exec"])
        .expect("exec should spawn");
    let lines: Vec<String> = exec.by_ref().collect().await;
    exec.finish().await.expect("exec should succeed");
    assert!(
        lines.iter().any(|line| line == "streamed-by-exec"),
        "exec output should be streamed back, got {lines:?}"
    );

    let failing = container.exec(&["false"]).expect("exec should spawn");
    let err = failing.finish().await.expect_err("command exits non-zero");
    assert!(matches!(err, ContainerError::Exec), "got {err:?}");

    container.stop().await.expect("stop should succeed");
    assert!(
        !container.is_started().await.expect("listing should succeed"),
        "stopped container should not be running"
    );

    container.remove().await.expect("remove should succeed");
    image.remove().await.expect("image remove should succeed");
}

/// Creating from an image the engine does not know is a create failure
/// carrying the engine's diagnostics.
#[test_group::group(engine)]
#[tokio::test]
async fn creating_from_a_missing_image_reports_create_kind() {
    let engine = require_engine!();
    let container = throwaway_container(engine, "skafos-test:no-such-image");

    let err = container.create().await.expect_err("image does not exist");
    match err {
        ContainerError::Create(stderr) => {
            assert!(!stderr.is_empty(), "diagnostics should not be empty")
        }
        other => panic!("expected Create, got {other:?}"),
    }
}

/// The substring name filter never inflates existence: a longer name that
/// contains this one does not count.
#[test_group::group(engine)]
#[tokio::test]
async fn existence_requires_an_exact_name_match() {
    let engine = require_engine!();

    let base = format!("skafos-test-{}", support::unique_suffix());
    let image = Image::with_engine(engine, ImageRef::parse("alpine:latest").unwrap());
    let longer = Container::new(ContainerName::new(&format!("{base}-extra")).unwrap(), &image);
    let shorter = Container::new(ContainerName::new(&base).unwrap(), &image);

    longer.create().await.expect("create should succeed");

    assert!(
        !shorter.is_created().await.expect("listing should succeed"),
        "substring match must not count as existence"
    );
    assert!(
        longer.is_created().await.expect("listing should succeed"),
        "exact match should count"
    );

    longer.remove().await.expect("remove should succeed");
}
