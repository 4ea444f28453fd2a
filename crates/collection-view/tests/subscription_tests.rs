//! Tests for view subscriptions and push-based data sources.

use collection_view::{SortDirection, SortKey, View};
use tokio_stream::StreamExt;

#[tokio::test]
async fn test_subscription_replays_then_follows_changes() {
    let view = View::new(1..=6);
    view.set_page_size(3).unwrap();
    let mut pages = view.subscribe();

    assert_eq!(pages.next().await.unwrap(), vec![1, 2, 3]);

    view.go_to_next_page().unwrap();
    view.sort(SortKey::key(|n: &i32| *n), SortDirection::Descending);

    assert_eq!(pages.next().await.unwrap(), vec![4, 5, 6]);
    assert_eq!(pages.next().await.unwrap(), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_subscriptions_are_multicast() {
    let view = View::new(vec![1, 2, 3]);
    let mut first = view.subscribe();
    view.filter_by(|n| *n != 2);
    let mut second = view.subscribe();

    assert_eq!(first.next().await.unwrap(), vec![1, 2, 3]);
    assert_eq!(first.next().await.unwrap(), vec![1, 3]);
    // A late subscriber starts at the current page.
    assert_eq!(second.next().await.unwrap(), vec![1, 3]);

    view.set_data(vec![2, 4]);
    assert_eq!(first.next().await.unwrap(), vec![4]);
    assert_eq!(second.next().await.unwrap(), vec![4]);
}

#[tokio::test]
async fn test_follow_replaces_data_per_emission() {
    let view = View::<i32>::empty();
    view.filter_by(|n| n % 2 == 0);
    let mut pages = view.subscribe();
    assert!(pages.next().await.unwrap().is_empty());

    let source = tokio_stream::iter(vec![vec![1, 2, 3], vec![4, 5, 6, 8]]);
    view.follow(source).await;

    assert_eq!(view.data().to_vec(), vec![4, 5, 6, 8]);
    assert_eq!(pages.next().await.unwrap(), vec![2]);
    assert_eq!(pages.next().await.unwrap(), vec![4, 6, 8]);
}

#[tokio::test]
async fn test_follow_from_spawned_task() {
    let view = View::new(vec![0]);
    let (sender, receiver) = tokio::sync::mpsc::channel(4);

    let follower = {
        let view = view.clone();
        tokio::spawn(async move {
            view.follow(tokio_stream::wrappers::ReceiverStream::new(receiver))
                .await;
        })
    };

    sender.send(vec![1, 2]).await.unwrap();
    sender.send(vec![3]).await.unwrap();
    drop(sender);
    follower.await.unwrap();

    assert_eq!(view.view().to_vec(), vec![3]);
}
