use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_test::{assert_pending, assert_ready_eq};

use newsdesk::app::{ApiError, ApiResult};
use newsdesk::cache_key;
use newsdesk::query::{QueryClient, QueryConfig, QueryStatus};

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

/// Loader that counts its calls and returns the call number.
fn counting_loader(
    calls: &Arc<AtomicUsize>,
) -> impl Fn() -> BoxFuture<'static, ApiResult<usize>> + Send + Sync + 'static {
    let calls = calls.clone();
    move || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move { Ok(n) }.boxed()
    }
}

#[tokio::test(start_paused = true)]
async fn slow_early_fetch_cannot_overwrite_refresh() {
    let client = QueryClient::default();
    let key = cache_key!["articles", "trending", 5usize];
    let calls = counter();

    let loader_calls = calls.clone();
    let mut sub = client.subscribe(key.clone(), move || {
        let n = loader_calls.fetch_add(1, Ordering::SeqCst);
        async move {
            // First call is slow, later calls answer at once.
            if n == 0 {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("stale".to_string())
            } else {
                Ok("fresh".to_string())
            }
        }
    });

    tokio::task::yield_now().await;
    sub.refresh();
    let state = sub.settled().await;
    assert_eq!(state.data().map(String::as_str), Some("fresh"));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(sub.state().data().map(String::as_str), Some("fresh"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn refresh_on_unknown_key_is_noop() {
    let client = QueryClient::default();
    assert!(!client.refresh(&cache_key!["authors", "nobody"]));
}

#[tokio::test]
async fn error_is_stored_and_not_retried() {
    let client = QueryClient::default();
    let key = cache_key!["authors", "u1"];
    let calls = counter();

    let loader_calls = calls.clone();
    let loader = move || {
        loader_calls.fetch_add(1, Ordering::SeqCst);
        async {
            Err::<String, _>(ApiError::Http {
                status: 500,
                message: "boom".into(),
            })
        }
    };

    let mut first = client.subscribe(key.clone(), loader.clone());
    let state = first.settled().await;
    assert!(state.is_error());
    assert_eq!(state.error.unwrap().to_string(), "boom");

    let second = client.subscribe(key.clone(), loader);
    assert!(second.state().is_error());
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalidated_error_entry_refetches_on_next_subscribe() {
    let client = QueryClient::default();
    let key = cache_key!["authors", "u1"];
    let calls = counter();

    let loader_calls = calls.clone();
    let loader = move || {
        let n = loader_calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(ApiError::Network("offline".into()))
            } else {
                Ok("Sam Lee".to_string())
            }
        }
    };

    let mut first = client.subscribe(key.clone(), loader.clone());
    assert!(first.settled().await.is_error());
    drop(first);

    client.invalidate(&key);
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let mut again = client.subscribe(key, loader);
    let state = again.settled().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(state.status, QueryStatus::Success);
    assert_eq!(state.data().map(String::as_str), Some("Sam Lee"));
}

#[tokio::test]
async fn loader_may_subscribe_before_returning_its_future() {
    let client = QueryClient::default();
    let author_key = cache_key!["authors", "u1"];
    let calls = counter();

    let nested = client.clone();
    let nested_key = author_key.clone();
    let nested_calls = calls.clone();
    let mut article = client.subscribe(cache_key!["articles", "single", "a1"], move || {
        let mut author = nested.subscribe(nested_key.clone(), counting_loader(&nested_calls));
        async move { Ok(author.settled().await.data().copied().unwrap_or_default()) }
    });

    let state = article.settled().await;

    assert_eq!(state.data().copied(), Some(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(client.contains(&author_key));
}

#[tokio::test]
async fn error_keeps_previous_data() {
    let client = QueryClient::default();
    let key = cache_key!["categories", "full"];
    let calls = counter();

    let loader_calls = calls.clone();
    let mut sub = client.subscribe(key.clone(), move || {
        let n = loader_calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Ok(vec!["sports".to_string()])
            } else {
                Err(ApiError::Network("offline".into()))
            }
        }
    });
    sub.settled().await;

    sub.refresh();
    let state = sub.settled().await;

    assert_eq!(state.status, QueryStatus::Error);
    assert_eq!(state.data().unwrap(), &["sports".to_string()]);
}

#[tokio::test]
async fn panicking_loader_becomes_task_error() {
    let client = QueryClient::default();
    let key = cache_key!["articles", "single", "boom"];

    let mut sub = client.subscribe(key, || async {
        if true {
            panic!("loader blew up");
        }
        Ok(0u32)
    });
    let state = sub.settled().await;

    assert!(matches!(state.error, Some(ApiError::Task(_))));
}

#[tokio::test]
async fn wrong_type_for_key_is_reported() {
    let client = QueryClient::default();
    let key = cache_key!["ads"];

    let mut as_text = client.subscribe(key.clone(), || async { Ok("text".to_string()) });
    as_text.settled().await;

    let as_number = client.subscribe::<u64, _, _>(key, || async { Ok(1u64) });
    let state = as_number.state();

    assert!(state.is_error());
    assert!(matches!(state.error, Some(ApiError::TypeMismatch(_))));
}

#[tokio::test]
async fn invalidate_refetches_live_entries() {
    let client = QueryClient::default();
    let key = cache_key!["articles", "category", "sports", 20usize];
    let calls = counter();

    let mut sub = client.subscribe(key.clone(), counting_loader(&calls));
    sub.settled().await;

    client.invalidate(&key);
    let state = sub.settled().await;

    assert_eq!(*state.data().unwrap(), 2);
}

#[tokio::test]
async fn invalidate_prefix_marks_unused_entries_stale() {
    let client = QueryClient::default();
    let sports = cache_key!["articles", "category", "sports", 20usize];
    let authors = cache_key!["authors", "u1"];
    let calls = counter();

    let mut a = client.subscribe(sports.clone(), counting_loader(&calls));
    let mut b = client.subscribe(authors.clone(), counting_loader(&calls));
    a.settled().await;
    b.settled().await;
    drop(a);

    client.invalidate_prefix(&cache_key!["articles"]);
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Stale now, so the next subscriber refetches.
    let mut again = client.subscribe(sports, counting_loader(&calls));
    assert!(again.state().is_fetching());
    again.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn stale_entry_refetches_while_serving_data() {
    let client = QueryClient::new(QueryConfig {
        stale_time_secs: Some(60),
        ..QueryConfig::default()
    });
    let key = cache_key!["articles", "featured", 5usize];
    let calls = counter();

    let mut first = client.subscribe(key.clone(), counting_loader(&calls));
    first.settled().await;

    let fresh = client.subscribe(key.clone(), counting_loader(&calls));
    assert!(fresh.state().is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(61)).await;

    let mut stale = client.subscribe(key, counting_loader(&calls));
    let during = stale.state();
    assert!(during.is_fetching());
    assert!(!during.is_loading());
    assert_eq!(during.data().copied(), Some(1));

    assert_eq!(stale.settled().await.data().copied(), Some(2));
}

#[tokio::test(start_paused = true)]
async fn unused_entry_is_evicted_after_grace_period() {
    let client = QueryClient::new(QueryConfig {
        gc_time_secs: 300,
        ..QueryConfig::default()
    });
    let key = cache_key!["authors", "u1"];
    let calls = counter();

    let mut sub = client.subscribe(key.clone(), counting_loader(&calls));
    sub.settled().await;
    drop(sub);
    assert_eq!(client.subscriber_count(&key), Some(0));

    tokio::time::sleep(Duration::from_secs(299)).await;
    assert!(client.contains(&key));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!client.contains(&key));
}

#[tokio::test(start_paused = true)]
async fn resubscribing_within_grace_period_keeps_entry() {
    let client = QueryClient::new(QueryConfig {
        gc_time_secs: 300,
        ..QueryConfig::default()
    });
    let key = cache_key!["authors", "u1"];
    let calls = counter();

    let mut sub = client.subscribe(key.clone(), counting_loader(&calls));
    sub.settled().await;
    drop(sub);

    tokio::time::sleep(Duration::from_secs(100)).await;
    let held = client.subscribe(key.clone(), counting_loader(&calls));
    tokio::time::sleep(Duration::from_secs(400)).await;

    assert!(client.contains(&key));
    assert_eq!(held.state().data().copied(), Some(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_gc_time_evicts_on_last_unsubscribe() {
    let client = QueryClient::new(QueryConfig {
        gc_time_secs: 0,
        ..QueryConfig::default()
    });
    let key = cache_key!["ads"];
    let calls = counter();

    let mut a = client.subscribe(key.clone(), counting_loader(&calls));
    let b = client.subscribe(key.clone(), counting_loader(&calls));
    a.settled().await;

    drop(a);
    assert!(client.contains(&key));
    drop(b);
    assert!(!client.contains(&key));
}

#[tokio::test(start_paused = true)]
async fn max_entries_evicts_least_recently_released() {
    let client = QueryClient::new(QueryConfig {
        max_entries: 2,
        ..QueryConfig::default()
    });
    let calls = counter();
    let first = cache_key!["articles", "tag", "a", 20usize];
    let second = cache_key!["articles", "tag", "b", 20usize];
    let third = cache_key!["articles", "tag", "c", 20usize];

    let mut sub = client.subscribe(first.clone(), counting_loader(&calls));
    sub.settled().await;
    drop(sub);
    tokio::time::advance(Duration::from_secs(1)).await;

    let mut sub = client.subscribe(second.clone(), counting_loader(&calls));
    sub.settled().await;
    drop(sub);
    tokio::time::advance(Duration::from_secs(1)).await;

    let _third = client.subscribe(third.clone(), counting_loader(&calls));

    assert_eq!(client.len(), 2);
    assert!(!client.contains(&first));
    assert!(client.contains(&second));
    assert!(client.contains(&third));
}

#[tokio::test]
async fn live_entries_are_never_evicted() {
    let client = QueryClient::new(QueryConfig {
        max_entries: 1,
        ..QueryConfig::default()
    });
    let calls = counter();

    let _a = client.subscribe(cache_key!["a"], counting_loader(&calls));
    let _b = client.subscribe(cache_key!["b"], counting_loader(&calls));

    assert_eq!(client.len(), 2);
}

#[tokio::test]
async fn settled_subscription_waits_for_next_change() {
    let client = QueryClient::default();
    let key = cache_key!["categories", "full"];
    let calls = counter();

    let mut sub = client.subscribe(key.clone(), counting_loader(&calls));
    sub.settled().await;

    {
        let mut changed = tokio_test::task::spawn(sub.changed());
        assert_pending!(changed.poll());
    }

    client.remove(&key);
    let mut changed = tokio_test::task::spawn(sub.changed());
    assert_ready_eq!(changed.poll(), false);
}

#[tokio::test]
async fn clear_empties_cache() {
    let client = QueryClient::default();
    let calls = counter();
    let _a = client.subscribe(cache_key!["a"], counting_loader(&calls));
    let _b = client.subscribe(cache_key!["b"], counting_loader(&calls));

    client.clear();

    assert!(client.is_empty());
    assert!(client.state::<usize>(&cache_key!["a"]).is_none());
}
