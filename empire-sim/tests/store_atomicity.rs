use std::thread;

use empire_sim::{
    Buildings, CampaignId, CampaignState, CampaignStore, FailurePoint, MemoryStore,
    MemoryStoreError, QueueItem, QueueKind, Resources, StepEngine, StepError, StoreTransaction,
};

fn campaign(id: i64) -> CampaignState {
    CampaignState::new(CampaignId(id))
        .with_resources(Resources::from([
            ("credits", 2_000),
            ("materials", 2_000),
            ("energy", 1_000),
            ("food", 800),
        ]))
        .with_buildings(Buildings::from([("factory", 1), ("farm", 2)]))
        .with_queue(vec![QueueItem::new("farm-1", QueueKind::Building, "farm", 0.5)])
}

#[test]
fn every_failure_point_rolls_back_the_whole_step() {
    for point in FailurePoint::ALL {
        let engine = StepEngine::new(MemoryStore::with_campaigns([campaign(1)]));
        engine.store().fail_once(point).expect("arm failure");

        let err = engine
            .step(CampaignId(1), "atomic", &[])
            .expect_err("step should fail");
        assert!(
            matches!(err, StepError::Store(MemoryStoreError::Injected(p)) if p == point),
            "{point:?}: {err}"
        );

        let store = engine.store();
        assert_eq!(
            store.campaign(CampaignId(1)).expect("read"),
            Some(campaign(1)),
            "{point:?} leaked state"
        );
        assert!(store.kpi_history(CampaignId(1)).expect("history").is_empty());
        assert!(store.published_events(CampaignId(1)).expect("outbox").is_empty());

        // The same step succeeds once the fault clears and matches a clean run.
        let retried = engine.step(CampaignId(1), "atomic", &[]).expect("retry");
        let clean = StepEngine::new(MemoryStore::with_campaigns([campaign(1)]))
            .step(CampaignId(1), "atomic", &[])
            .expect("clean");
        assert_eq!(retried, clean);
    }
}

#[test]
fn missing_campaign_surfaces_store_error() {
    let engine = StepEngine::new(MemoryStore::new());
    let err = engine.step(CampaignId(42), "seed", &[]).expect_err("missing");
    assert!(matches!(
        err,
        StepError::Store(MemoryStoreError::CampaignNotFound(CampaignId(42)))
    ));
}

#[test]
fn history_and_outbox_accumulate_per_commit() {
    let engine = StepEngine::new(MemoryStore::with_campaigns([campaign(1)]));
    let mut expected_events = 0;
    for step in 0..3 {
        let outcome = engine
            .step(CampaignId(1), &format!("hist-{step}"), &[])
            .expect("step");
        expected_events += outcome.events.len();
    }
    let store = engine.store();
    let history = store.kpi_history(CampaignId(1)).expect("history");
    assert_eq!(history.iter().map(|row| row.step).collect::<Vec<_>>(), vec![1, 2, 3]);
    let published = store.published_events(CampaignId(1)).expect("outbox");
    assert_eq!(published.len(), expected_events);
    assert!(published.windows(2).all(|pair| pair[0].step <= pair[1].step));
}

#[test]
fn transaction_reads_its_own_staged_writes() {
    let store = MemoryStore::with_campaigns([campaign(1)]);
    let mut tx = store.begin(CampaignId(1)).expect("begin");
    let mut state = tx.load_state().expect("load");
    state.step = 9;
    tx.persist_state(&state).expect("persist");
    assert_eq!(tx.load_state().expect("reload").step, 9);
    drop(tx);
    assert_eq!(
        store
            .campaign(CampaignId(1))
            .expect("read")
            .map(|state| state.step),
        Some(0)
    );
}

#[test]
fn concurrent_steps_on_separate_campaigns_match_sequential_runs() {
    let ids = [1, 2, 3, 4];
    let shared = StepEngine::new(MemoryStore::with_campaigns(ids.map(campaign)));
    thread::scope(|scope| {
        for id in ids {
            let engine = &shared;
            scope.spawn(move || {
                for step in 0..5 {
                    engine
                        .step(CampaignId(id), &format!("par-{id}-{step}"), &[])
                        .expect("parallel step");
                }
            });
        }
    });

    for id in ids {
        let solo = StepEngine::new(MemoryStore::with_campaigns([campaign(id)]));
        for step in 0..5 {
            solo.step(CampaignId(id), &format!("par-{id}-{step}"), &[])
                .expect("solo step");
        }
        assert_eq!(
            shared.store().campaign(CampaignId(id)).expect("read"),
            solo.store().campaign(CampaignId(id)).expect("read"),
            "campaign {id} diverged under concurrency"
        );
    }
}
