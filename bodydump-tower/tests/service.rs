use std::convert::Infallible;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::routing::post;
use bodydump_core::BufferPool;
use bodydump_http::filters::Path;
use bodydump_tower::{BodyDump, BodyHandler, DumpContext, ReplayBody, body_handler};
use bytes::Bytes;
use futures::stream;
use http::{HeaderMap, Request, Response, StatusCode};
use http_body::{Body as _, Frame};
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use pretty_assertions::assert_eq;
use rand::Rng;
use tower::{ServiceBuilder, ServiceExt, service_fn};

type Chunks<E> = StreamBody<stream::Iter<std::vec::IntoIter<Result<Frame<Bytes>, E>>>>;

#[derive(Clone, Default)]
struct Recorded(Arc<Mutex<Vec<(Option<StatusCode>, Bytes)>>>);

impl Recorded {
    fn handler(&self) -> BodyHandler {
        let sink = Arc::clone(&self.0);
        body_handler(move |ctx: &DumpContext<'_>, body: &[u8]| {
            sink.lock()
                .unwrap()
                .push((ctx.status(), Bytes::copy_from_slice(body)));
        })
    }

    fn bodies(&self) -> Vec<Bytes> {
        self.0.lock().unwrap().iter().map(|(_, body)| body.clone()).collect()
    }

    fn statuses(&self) -> Vec<Option<StatusCode>> {
        self.0.lock().unwrap().iter().map(|(status, _)| *status).collect()
    }
}

fn random_payload(len: usize) -> Bytes {
    let mut payload = vec![0u8; len];
    rand::thread_rng().fill(&mut payload[..]);
    Bytes::from(payload)
}

async fn echo<B>(request: Request<ReplayBody<B>>) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: http_body::Body,
    B::Error: std::fmt::Debug,
{
    let body = request.into_body().collect().await.unwrap().to_bytes();
    Ok(Response::new(Full::new(body)))
}

#[tokio::test]
async fn test_axum_echo_one_mebibyte() {
    let payload = random_payload(1024 * 1024);
    let requests = Recorded::default();
    let responses = Recorded::default();
    let layer = BodyDump::new(Some(requests.handler()), Some(responses.handler()));
    let pool = layer.config().pool().clone();

    let app = Router::new()
        .route("/echo", post(|body: Bytes| async move { body }))
        .layer(layer);

    let response = app
        .oneshot(
            Request::post("/echo")
                .body(axum::body::Body::from(payload.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();

    assert!(body == payload);
    assert!(requests.bodies() == vec![payload.clone()]);
    assert!(responses.bodies() == vec![payload]);
    assert_eq!(responses.statuses(), vec![Some(StatusCode::OK)]);
    assert_eq!(pool.stats().in_use(), 0);
}

#[tokio::test]
async fn test_streamed_request_is_replayed_in_full() {
    let requests = Recorded::default();
    let service = ServiceBuilder::new()
        .layer(BodyDump::new(Some(requests.handler()), None))
        .service(service_fn(echo::<Chunks<Infallible>>));

    let chunks = stream::iter(vec![
        Ok::<_, Infallible>(Frame::data(Bytes::from("first "))),
        Ok::<_, Infallible>(Frame::data(Bytes::from("second "))),
        Ok::<_, Infallible>(Frame::data(Bytes::from("third"))),
    ]);
    let response = service
        .oneshot(Request::post("/upload").body(StreamBody::new(chunks)).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(body, Bytes::from("first second third"));
    assert_eq!(requests.bodies(), vec![Bytes::from("first second third")]);
    assert_eq!(requests.statuses(), vec![None]);
}

#[tokio::test]
async fn test_request_trailers_survive_capture() {
    let requests = Recorded::default();
    let service = ServiceBuilder::new()
        .layer(BodyDump::new(Some(requests.handler()), None))
        .service(service_fn(|request: Request<ReplayBody<Chunks<Infallible>>>| async move {
            let collected = request.into_body().collect().await.unwrap();
            let trailers = collected.trailers().cloned().unwrap_or_default();
            let checksum = trailers
                .get("x-checksum")
                .map(|value| value.to_str().unwrap().to_owned())
                .unwrap_or_default();
            Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(checksum))))
        }));

    let mut trailers = HeaderMap::new();
    trailers.insert("x-checksum", "c0ffee".parse().unwrap());
    let chunks = stream::iter(vec![
        Ok::<_, Infallible>(Frame::data(Bytes::from("payload"))),
        Ok::<_, Infallible>(Frame::trailers(trailers)),
    ]);
    let response = service
        .oneshot(Request::post("/").body(StreamBody::new(chunks)).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(body, Bytes::from("c0ffee"));
    assert_eq!(requests.bodies(), vec![Bytes::from("payload")]);
}

#[tokio::test]
async fn test_filtered_path_skips_both_callbacks() {
    let layer = BodyDump::builder()
        .on_request(|ctx, _| panic!("request callback invoked for {}", ctx.path()))
        .on_response(|ctx, _| panic!("response callback invoked for {}", ctx.path()))
        .filter(Path::new("/foo"))
        .build();
    let pool = layer.config().pool().clone();
    let service = ServiceBuilder::new().layer(layer).service(service_fn(echo::<Full<Bytes>>));

    let response = service
        .oneshot(
            Request::post("/foo")
                .body(Full::new(Bytes::from("untouched")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(body, Bytes::from("untouched"));
    assert_eq!(pool.stats().acquired, 0);
}

#[tokio::test]
async fn test_no_callbacks_touch_nothing() {
    let layer = BodyDump::new(None, None);
    let pool = layer.config().pool().clone();
    let service = ServiceBuilder::new().layer(layer).service(service_fn(echo::<Full<Bytes>>));

    let response = service
        .oneshot(Request::post("/").body(Full::new(Bytes::from("plain"))).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(body, Bytes::from("plain"));
    assert_eq!(pool.stats().created, 0);
    assert_eq!(pool.stats().acquired, 0);
}

#[tokio::test]
async fn test_read_failure_falls_back_and_dumps_response() {
    let requests = Recorded::default();
    let responses = Recorded::default();
    let layer = BodyDump::new(Some(requests.handler()), Some(responses.handler()));
    let pool = layer.config().pool().clone();

    let service = ServiceBuilder::new()
        .layer(layer)
        .service(service_fn(|request: Request<ReplayBody<Chunks<io::Error>>>| async move {
            let mut body = request.into_body();
            let prefix = body.frame().await.unwrap().unwrap().into_data().unwrap();
            let error: io::Error = body.frame().await.unwrap().unwrap_err();
            assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);

            let message = format!("read {} bytes before failure", prefix.len());
            let mut response = Response::new(Full::new(Bytes::from(message)));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            Ok::<_, Infallible>(response)
        }));

    let chunks = stream::iter(vec![
        Ok(Frame::data(Bytes::from("partial"))),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset")),
    ]);
    let response = service
        .oneshot(Request::post("/upload").body(StreamBody::new(chunks)).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();

    assert!(requests.bodies().is_empty());
    assert_eq!(body, Bytes::from("read 7 bytes before failure"));
    assert_eq!(responses.bodies(), vec![body]);
    assert_eq!(responses.statuses(), vec![Some(StatusCode::BAD_REQUEST)]);
    assert_eq!(pool.stats().acquired, 2);
    assert_eq!(pool.stats().in_use(), 0);
}

#[tokio::test]
async fn test_streamed_response_is_mirrored_once() {
    let responses = Recorded::default();
    let service = ServiceBuilder::new()
        .layer(BodyDump::new(None, Some(responses.handler())))
        .service(service_fn(|_: Request<ReplayBody<Empty<Bytes>>>| async {
            let chunks = stream::iter(vec![
                Ok::<_, Infallible>(Frame::data(Bytes::from("a,"))),
                Ok::<_, Infallible>(Frame::data(Bytes::from("b,"))),
                Ok::<_, Infallible>(Frame::data(Bytes::from("c"))),
            ]);
            Ok::<_, Infallible>(Response::new(StreamBody::new(chunks)))
        }));

    let response = service
        .oneshot(Request::get("/list").body(Empty::new()).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(body, Bytes::from("a,b,c"));
    assert_eq!(responses.bodies(), vec![Bytes::from("a,b,c")]);
}

#[tokio::test]
async fn test_empty_response_reports_without_polling() {
    let responses = Recorded::default();
    let service = ServiceBuilder::new()
        .layer(BodyDump::new(None, Some(responses.handler())))
        .service(service_fn(|_: Request<ReplayBody<Empty<Bytes>>>| async {
            let mut response = Response::new(Empty::<Bytes>::new());
            *response.status_mut() = StatusCode::NO_CONTENT;
            Ok::<_, Infallible>(response)
        }));

    let response = service
        .oneshot(Request::delete("/item").body(Empty::new()).unwrap())
        .await
        .unwrap();

    assert!(response.body().is_end_stream());
    assert_eq!(responses.statuses(), vec![Some(StatusCode::NO_CONTENT)]);
    assert_eq!(responses.bodies(), vec![Bytes::new()]);
}

#[tokio::test]
async fn test_dropped_response_releases_buffer_silently() {
    let pool = BufferPool::new();
    let layer = BodyDump::builder()
        .on_response(|_, _| panic!("response callback invoked for an abandoned body"))
        .pool(pool.clone())
        .build();
    let service = ServiceBuilder::new()
        .layer(layer)
        .service(service_fn(|_: Request<ReplayBody<Empty<Bytes>>>| async {
            let chunks = stream::iter(vec![
                Ok::<_, Infallible>(Frame::data(Bytes::from("never"))),
                Ok::<_, Infallible>(Frame::data(Bytes::from("read"))),
            ]);
            Ok::<_, Infallible>(Response::new(StreamBody::new(chunks)))
        }));

    let response = service
        .oneshot(Request::get("/").body(Empty::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(pool.stats().in_use(), 1);

    drop(response);
    assert_eq!(pool.stats().in_use(), 0);
}

#[tokio::test]
async fn test_request_toggle_off_only_dumps_response() {
    let responses = Recorded::default();
    let layer = BodyDump::builder()
        .on_request(|ctx, _| panic!("request callback invoked for {}", ctx.path()))
        .on_response({
            let handler = responses.handler();
            move |ctx, body| handler(ctx, body)
        })
        .capture_request(false)
        .build();
    let service = ServiceBuilder::new().layer(layer).service(service_fn(echo::<Full<Bytes>>));

    let response = service
        .oneshot(Request::post("/").body(Full::new(Bytes::from("hi"))).unwrap())
        .await
        .unwrap();
    let _ = response.into_body().collect().await.unwrap();

    assert_eq!(responses.bodies(), vec![Bytes::from("hi")]);
}

#[tokio::test]
async fn test_concurrent_requests_are_isolated() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let layer = BodyDump::builder()
        .on_request(move |ctx, body| {
            let id = ctx.headers()["x-id"].as_bytes();
            assert!(body.starts_with(id));
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .on_response(|ctx, body| {
            let id = ctx.headers()["x-id"].as_bytes();
            assert!(body.starts_with(id));
        })
        .build();
    let pool = layer.config().pool().clone();
    let service = ServiceBuilder::new().layer(layer).service(service_fn(echo::<Full<Bytes>>));

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                let id = format!("request-{i}:");
                let mut body = id.clone().into_bytes();
                body.extend_from_slice(&random_payload(4096));
                let body = Bytes::from(body);

                let response = service
                    .oneshot(
                        Request::post("/")
                            .header("x-id", id)
                            .body(Full::new(body.clone()))
                            .unwrap(),
                    )
                    .await
                    .unwrap();
                let echoed = response.into_body().collect().await.unwrap().to_bytes();
                assert!(echoed == body);
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(seen.load(Ordering::SeqCst), 64);
    assert_eq!(pool.stats().in_use(), 0);
}
