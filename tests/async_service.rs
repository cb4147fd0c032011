use thingdeck::async_api::DeckService;
use thingdeck::flip::{Face, FlipTarget};
use thingdeck::{Category, Deck, Error, ExportConfig, ExportPlan, Session, ShuffleTiming};

fn config() -> ExportConfig {
    ExportConfig {
        scale: 1,
        settle_delay_ms: 0,
        ..Default::default()
    }
}

async fn service(seed: u64) -> DeckService {
    DeckService::new(
        move || Ok(Session::new(Deck::builtin(), seed).with_timing(ShuffleTiming::immediate())),
        config(),
    )
    .await
    .expect("service starts")
}

#[tokio::test]
async fn concurrent_exports_are_serialized() {
    let svc = service(8).await;
    let (a, b) = tokio::join!(
        svc.export(ExportPlan::mixed_hand()),
        svc.export(ExportPlan::category(Category::Arc))
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.job.captured, 4);
    assert_eq!(b.job.captured, 1 + Deck::builtin().count(Category::Arc));
    svc.close().await.unwrap();
}

#[tokio::test]
async fn shuffle_redraws_only_the_target() {
    let svc = service(2).await;
    let before = svc.sentence().await.unwrap();
    for _ in 0..7 {
        svc.shuffle(FlipTarget::Category(Category::Mood)).await.unwrap();
    }
    let after = svc.shuffle(FlipTarget::Category(Category::Mood)).await.unwrap();
    assert_eq!(after.arc, before.arc);
    assert_eq!(after.object, before.object);
    assert_eq!(after.terrain, before.terrain);
    svc.close().await.unwrap();
}

#[tokio::test]
async fn master_toggle_round_trip() {
    let svc = service(1).await;
    assert_eq!(svc.master_toggle(Category::Object).await.unwrap().action, Face::Front);
    assert_eq!(svc.master_toggle(Category::Object).await.unwrap().action, Face::Back);
    assert!(svc.markup().await.unwrap().contains("full-deck-capture-container"));
    svc.close().await.unwrap();
}

#[tokio::test]
async fn failed_session_setup_is_reported() {
    let result = DeckService::new(|| Err(Error::DeckData("bad deck".into())), config()).await;
    assert!(matches!(result, Err(Error::DeckData(_))));
}

#[tokio::test]
async fn requests_after_close_fail() {
    let svc = service(4).await;
    let other = svc.clone();
    svc.close().await.unwrap();
    assert!(other.sentence().await.is_err());
}
