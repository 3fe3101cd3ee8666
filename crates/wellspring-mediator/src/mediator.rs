//! Publisher mediator.
//!
//! Binds one producer method to the outward message stream. The shape
//! classifier runs at construction; `initialize` builds the sequence for
//! the selected strategy and applies the decoration hook; `stream` hands
//! the sequence to the connector exactly once.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{future, stream, FutureExt, Stream, StreamExt};
use tracing::debug;

use wellspring_core::{
    BoxError, ConfigurationError, MediatorConfiguration, MediatorError, Message, MessageStream,
    OutwardStream, ProduceError,
};

use crate::decorate::{identity, SequenceDecorator};
use crate::generate::generate;
use crate::invoke::{invoke, invoke_blocking, Producer, ProducerFn};
use crate::merge::{bounded_merge, MergeMode};
use crate::pool::WorkerPool;
use crate::strategy::{BlockingPolicy, Strategy};

/// Mediator for publisher-shaped methods.
///
/// One instance adapts exactly one producer method. The production
/// strategy is selected at construction and never changes.
pub struct PublisherMediator<T> {
    config: MediatorConfiguration,
    method: Arc<str>,
    strategy: Strategy,
    pool: WorkerPool,
    decorator: Box<dyn SequenceDecorator<T>>,
    outward: Option<OutwardStream<T>>,
    initialized: bool,
}

impl<T: Send + 'static> PublisherMediator<T> {
    /// Create a mediator for `config`, classifying its shape.
    ///
    /// # Errors
    ///
    /// Fails fast with a [`ConfigurationError`] for non-publisher shapes
    /// and unsupported production kinds; misconfiguration never survives
    /// to the first pull.
    pub fn new(config: MediatorConfiguration, pool: WorkerPool) -> Result<Self, ConfigurationError> {
        let strategy = Strategy::select(&config)?;
        debug!(
            method = %config.method(),
            strategy = ?strategy,
            "Selected production strategy"
        );

        Ok(Self {
            method: Arc::from(config.method()),
            config,
            strategy,
            pool,
            decorator: Box::new(identity()),
            outward: None,
            initialized: false,
        })
    }

    /// Install the decoration hook, replacing the identity default.
    /// Takes effect for sequences built by a later `initialize`.
    #[must_use]
    pub fn with_decorator(mut self, decorator: impl SequenceDecorator<T> + 'static) -> Self {
        self.decorator = Box::new(decorator);
        self
    }

    /// The configuration this mediator was built from.
    #[must_use]
    pub fn configuration(&self) -> &MediatorConfiguration {
        &self.config
    }

    /// Whether the mediator has a ready source. Always true: a publisher
    /// mediator is its own source.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        true
    }

    /// Build the outward sequence from the bound producer callable.
    /// Called exactly once.
    ///
    /// # Errors
    ///
    /// Fails when called a second time, or when the producer callable does
    /// not match the configured production kind.
    pub fn initialize(&mut self, producer: Producer<T>) -> Result<(), MediatorError> {
        if self.initialized {
            return Err(MediatorError::AlreadyInitialized);
        }

        if producer.production() != self.config.production()
            || producer.uses_builder_types() != self.config.uses_builder_types()
        {
            return Err(MediatorError::Configuration(
                ConfigurationError::ProducerMismatch {
                    method: self.method.to_string(),
                    expected: self.config.production(),
                },
            ));
        }

        let raw = self.build_stream(producer);
        self.outward = Some(self.decorator.decorate(raw));
        self.initialized = true;
        debug!(method = %self.method, "Initialized publisher mediator");
        Ok(())
    }

    /// Hand the outward sequence to its consumer.
    ///
    /// The sequence is produced once and owned by whoever takes it;
    /// re-observation and restarts are not supported.
    ///
    /// # Errors
    ///
    /// Fails before `initialize`, and again once the stream is taken.
    pub fn stream(&mut self) -> Result<OutwardStream<T>, MediatorError> {
        if !self.initialized {
            return Err(MediatorError::NotInitialized);
        }
        self.outward.take().ok_or(MediatorError::StreamAlreadyTaken)
    }

    fn build_stream(&self, producer: Producer<T>) -> OutwardStream<T> {
        let method = self.method.clone();
        let offload = match self.strategy {
            Strategy::IndividualMessages { offload } | Strategy::IndividualPayloads { offload } => {
                offload
            }
            _ => None,
        };

        match producer {
            Producer::StreamOfMessages(f) => pass_through(method, f()),
            Producer::BuilderOfMessages(f) => pass_through(method, f().build()),
            Producer::StreamOfPayloads(f) => {
                pass_through(method, f().map(|item| item.map(Message::of)).boxed())
            }
            Producer::BuilderOfPayloads(f) => pass_through(
                method,
                f().build().map(|item| item.map(Message::of)).boxed(),
            ),
            Producer::IndividualMessages(producer) => {
                individual(method, producer, offload, &self.pool, |msg| msg)
            }
            Producer::IndividualPayloads(producer) => {
                individual(method, producer, offload, &self.pool, Message::of)
            }
            Producer::CompletionsOfMessages(mut f) => {
                sequential(method, move || f().boxed(), |msg| msg)
            }
            Producer::CompletionsOfPayloads(mut f) => {
                sequential(method, move || f().boxed(), Message::of)
            }
            Producer::FuturesOfMessages(mut f) => sequential(method, move || f(), |msg| msg),
            Producer::FuturesOfPayloads(mut f) => sequential(method, move || f(), Message::of),
        }
    }
}

/// Cut the sequence at its first failure; nothing is emitted past it.
fn until_terminal<T, S>(source: S) -> OutwardStream<T>
where
    T: Send + 'static,
    S: Stream<Item = Result<Message<T>, ProduceError>> + Send + 'static,
{
    source
        .scan(false, |errored, item| {
            if *errored {
                return future::ready(None);
            }
            if item.is_err() {
                *errored = true;
            }
            future::ready(Some(item))
        })
        .boxed()
}

/// Stream shapes: the user stream is the source; failures are tagged as
/// user-code failures of `method`.
fn pass_through<T: Send + 'static>(method: Arc<str>, source: MessageStream<T>) -> OutwardStream<T> {
    until_terminal(source.map(move |item| {
        item.map_err(|source| ProduceError::UserCode {
            method: method.to_string(),
            source,
        })
    }))
}

/// Individual-value shapes: one invocation per pull, inline or pooled.
fn individual<T, R, W>(
    method: Arc<str>,
    producer: ProducerFn<R>,
    offload: Option<BlockingPolicy>,
    pool: &WorkerPool,
    mut wrap: W,
) -> OutwardStream<T>
where
    T: Send + 'static,
    R: Send + 'static,
    W: FnMut(R) -> Message<T> + Send + 'static,
{
    match offload {
        None => generate(move || future::ready(invoke(&method, &producer)).boxed())
            .map(move |item| item.map(&mut wrap))
            .boxed(),
        Some(policy) => {
            let mode = match policy {
                BlockingPolicy::Ordered => MergeMode::Ordered,
                BlockingPolicy::Unordered => MergeMode::Unordered,
            };
            let capacity = pool.max_in_flight();
            let pool = pool.clone();
            let source =
                stream::repeat_with(move || invoke_blocking(method.clone(), producer.clone(), &pool));
            bounded_merge(source, capacity, mode)
                .map(move |item| item.map(&mut wrap))
                .boxed()
        }
    }
}

/// Completion and future shapes: one async handle per pull, awaited before
/// the next pull starts, so exactly one call is outstanding at a time.
fn sequential<T, R, W, F>(method: Arc<str>, mut next: F, mut wrap: W) -> OutwardStream<T>
where
    T: Send + 'static,
    R: Send + 'static,
    W: FnMut(R) -> Message<T> + Send + 'static,
    F: FnMut() -> BoxFuture<'static, Result<R, BoxError>> + Send + Unpin + 'static,
{
    generate(move || {
        let method = method.clone();
        let handle = next();
        async move {
            handle.await.map_err(|source| ProduceError::UserCode {
                method: method.to_string(),
                source,
            })
        }
        .boxed()
    })
    .map(move |item| item.map(&mut wrap))
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use wellspring_core::{Completion, ProductionKind, Shape, StreamBuilder};

    fn config(production: ProductionKind) -> MediatorConfiguration {
        MediatorConfiguration::new("app.Producer#generate", Shape::Publisher, production)
    }

    fn mediator<T: Send + 'static>(
        config: MediatorConfiguration,
    ) -> PublisherMediator<T> {
        PublisherMediator::new(config, WorkerPool::new(8)).unwrap()
    }

    async fn collect_ok<T>(stream: &mut OutwardStream<T>, n: usize) -> Vec<T> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let msg = stream.next().await.unwrap().unwrap();
            out.push(msg.into_payload());
        }
        out
    }

    #[tokio::test]
    async fn test_stream_of_messages_passes_through() {
        let mut mediator = mediator(config(ProductionKind::StreamOfMessage));
        mediator
            .initialize(Producer::StreamOfMessages(Box::new(|| {
                stream::iter(vec![Ok(Message::of("a")), Ok(Message::of("b"))]).boxed()
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 2).await, vec!["a", "b"]);
        assert!(outward.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_of_payloads_wraps_and_terminates() {
        let mut mediator = mediator(config(ProductionKind::StreamOfPayload));
        mediator
            .initialize(Producer::StreamOfPayloads(Box::new(|| {
                stream::iter(vec![Ok("a"), Ok("b"), Ok("c")]).boxed()
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 3).await, vec!["a", "b", "c"]);
        // Finite and non-restartable: the sequence is over.
        assert!(outward.next().await.is_none());
        assert!(outward.next().await.is_none());
    }

    #[tokio::test]
    async fn test_builder_shapes_unwrap() {
        let mut mediator = mediator(config(ProductionKind::StreamOfPayload).with_builder_types());
        mediator
            .initialize(Producer::BuilderOfPayloads(Box::new(|| {
                StreamBuilder::from_iter(1..=3).map(|n| n * 10)
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 3).await, vec![10, 20, 30]);
        assert!(outward.next().await.is_none());

        let mut mediator: PublisherMediator<u32> =
            mediator_for_builder_of_messages();
        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 2).await, vec![7, 8]);
    }

    fn mediator_for_builder_of_messages() -> PublisherMediator<u32> {
        let mut m = mediator(config(ProductionKind::StreamOfMessage).with_builder_types());
        m.initialize(Producer::BuilderOfMessages(Box::new(|| {
            StreamBuilder::from_iter(vec![Message::of(7u32), Message::of(8u32)])
        })))
        .unwrap();
        m
    }

    #[tokio::test]
    async fn test_stream_failure_is_terminal() {
        let mut mediator = mediator(config(ProductionKind::StreamOfPayload));
        mediator
            .initialize(Producer::StreamOfPayloads(Box::new(|| {
                stream::iter(vec![Ok(1), Err(BoxError::from("bad")), Ok(2)]).boxed()
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 1).await, vec![1]);
        assert!(matches!(
            outward.next().await.unwrap(),
            Err(ProduceError::UserCode { .. })
        ));
        // Nothing past the first failure, even though the user stream
        // had another item.
        assert!(outward.next().await.is_none());
    }

    #[tokio::test]
    async fn test_individual_payloads_in_call_order() {
        let mut mediator = mediator(config(ProductionKind::IndividualPayload));
        let counter = AtomicU64::new(0);
        mediator
            .initialize(Producer::IndividualPayloads(Arc::new(move || {
                Ok(Some(counter.fetch_add(1, Ordering::SeqCst) + 1))
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 5).await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_individual_messages_null_is_terminal() {
        let mut mediator = mediator(config(ProductionKind::IndividualMessage));
        let counter = AtomicU64::new(0);
        mediator
            .initialize(Producer::IndividualMessages(Arc::new(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 3 {
                    Ok(None)
                } else {
                    Ok(Some(Message::of(n)))
                }
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 2).await, vec![1, 2]);
        assert!(matches!(
            outward.next().await.unwrap(),
            Err(ProduceError::NullResult { .. })
        ));
        assert!(outward.next().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_blocking_ordered_preserves_call_order() {
        let mut mediator = mediator(config(ProductionKind::IndividualPayload).with_blocking(true));
        let counter = Arc::new(AtomicU64::new(0));
        mediator
            .initialize(Producer::IndividualPayloads(Arc::new(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                // Later calls finish earlier.
                if n <= 4 {
                    std::thread::sleep(Duration::from_millis((4 - n) * 40));
                }
                Ok(Some(n))
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 4).await, vec![1, 2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_blocking_unordered_emits_in_completion_order() {
        let mut mediator = mediator(config(ProductionKind::IndividualPayload).with_blocking(false));
        let counter = Arc::new(AtomicU64::new(0));
        mediator
            .initialize(Producer::IndividualPayloads(Arc::new(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                // Calls 1..=4 finish in reverse order; anything the window
                // pulled beyond them stays parked until the test is over.
                if n <= 4 {
                    std::thread::sleep(Duration::from_millis((4 - n) * 60));
                } else {
                    std::thread::sleep(Duration::from_millis(500));
                }
                Ok(Some(n))
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        let items = collect_ok(&mut outward, 4).await;

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4]);
        // The call that slept least completes and is emitted first.
        assert_eq!(items[0], 4);
        assert_eq!(items[3], 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_blocking_null_result_is_terminal() {
        let mut mediator = mediator(config(ProductionKind::IndividualPayload).with_blocking(true));
        let counter = Arc::new(AtomicU64::new(0));
        mediator
            .initialize(Producer::IndividualPayloads(Arc::new(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 2 {
                    Ok(None)
                } else {
                    Ok(Some(n))
                }
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        let mut saw_error = false;
        let mut after_error = 0;
        while let Some(item) = outward.next().await {
            match item {
                Ok(_) if saw_error => after_error += 1,
                Ok(_) => {}
                Err(err) => {
                    assert!(matches!(err, ProduceError::NullResult { .. }));
                    saw_error = true;
                }
            }
        }

        assert!(saw_error);
        assert_eq!(after_error, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancellation_stops_submissions() {
        let mut mediator = mediator(config(ProductionKind::IndividualPayload).with_blocking(true));
        let invocations = Arc::new(AtomicU64::new(0));
        let observed = invocations.clone();
        mediator
            .initialize(Producer::IndividualPayloads(Arc::new(move || {
                let n = observed.fetch_add(1, Ordering::SeqCst) + 1;
                std::thread::sleep(Duration::from_millis(10));
                Ok(Some(n))
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        collect_ok(&mut outward, 2).await;
        drop(outward);

        // Give anything already submitted time to run, then verify no new
        // invocations happen.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let settled = invocations.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(invocations.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    async fn test_completions_of_payloads_sequential() {
        let mut mediator = mediator(config(ProductionKind::CompletionOfPayload));
        let counter = AtomicU64::new(0);
        mediator
            .initialize(Producer::CompletionsOfPayloads(Box::new(move || {
                Completion::ready(counter.fetch_add(1, Ordering::SeqCst) + 1)
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 3).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_completions_of_messages() {
        let mut mediator = mediator(config(ProductionKind::CompletionOfMessage));
        let counter = AtomicU64::new(0);
        mediator
            .initialize(Producer::CompletionsOfMessages(Box::new(move || {
                Completion::ready(Message::of(counter.fetch_add(1, Ordering::SeqCst) + 1))
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 3).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_futures_of_payloads() {
        let mut mediator = mediator(config(ProductionKind::FutureOfPayload));
        let counter = Arc::new(AtomicU64::new(0));
        mediator
            .initialize(Producer::FuturesOfPayloads(Box::new(move || {
                let counter = counter.clone();
                Box::pin(async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) })
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 3).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_future_failure_is_terminal() {
        let mut mediator = mediator(config(ProductionKind::FutureOfMessage));
        let counter = Arc::new(AtomicU64::new(0));
        mediator
            .initialize(Producer::FuturesOfMessages(Box::new(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Box::pin(async move {
                    if n == 2 {
                        Err(BoxError::from("rejected"))
                    } else {
                        Ok(Message::of(n))
                    }
                })
            })))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 1).await, vec![1]);
        match outward.next().await.unwrap() {
            Err(ProduceError::UserCode { source, .. }) => {
                assert_eq!(source.to_string(), "rejected");
            }
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(outward.next().await.is_none());
    }

    #[tokio::test]
    async fn test_decorator_is_applied() {
        let mediator = mediator(config(ProductionKind::IndividualPayload));
        let mut mediator = mediator.with_decorator(|stream: OutwardStream<u64>| {
            stream
                .map(|item| item.map(|msg| msg.map(|n| n * 100)))
                .boxed()
        });
        mediator
            .initialize(Producer::IndividualPayloads(Arc::new(|| Ok(Some(1)))))
            .unwrap();

        let mut outward = mediator.stream().unwrap();
        assert_eq!(collect_ok(&mut outward, 2).await, vec![100, 100]);
    }

    #[tokio::test]
    async fn test_surface_misuse() {
        let mut mediator: PublisherMediator<u64> =
            mediator(config(ProductionKind::IndividualPayload));

        assert!(matches!(
            mediator.stream(),
            Err(MediatorError::NotInitialized)
        ));
        assert!(mediator.is_connected());

        mediator
            .initialize(Producer::IndividualPayloads(Arc::new(|| Ok(Some(1)))))
            .unwrap();
        assert!(matches!(
            mediator.initialize(Producer::IndividualPayloads(Arc::new(|| Ok(Some(2))))),
            Err(MediatorError::AlreadyInitialized)
        ));

        let _stream = mediator.stream().unwrap();
        assert!(matches!(
            mediator.stream(),
            Err(MediatorError::StreamAlreadyTaken)
        ));
    }

    #[tokio::test]
    async fn test_producer_mismatch_is_configuration_error() {
        let mut payload_mediator: PublisherMediator<u64> =
            mediator(config(ProductionKind::IndividualPayload));

        let wrong = Producer::IndividualMessages(Arc::new(|| Ok(Some(Message::of(1)))));
        assert!(matches!(
            payload_mediator.initialize(wrong),
            Err(MediatorError::Configuration(
                ConfigurationError::ProducerMismatch { .. }
            ))
        ));

        // The builder flag is part of the contract too.
        let bare_stream = Producer::StreamOfPayloads(Box::new(|| stream::empty().boxed()));
        let mut builder_config: PublisherMediator<u64> =
            mediator(config(ProductionKind::StreamOfPayload).with_builder_types());
        assert!(matches!(
            builder_config.initialize(bare_stream),
            Err(MediatorError::Configuration(
                ConfigurationError::ProducerMismatch { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_non_publisher_configuration_rejected() {
        let config = MediatorConfiguration::new(
            "app.Consumer#sink",
            Shape::Subscriber,
            ProductionKind::IndividualPayload,
        );
        assert!(matches!(
            PublisherMediator::<u64>::new(config, WorkerPool::new(8)),
            Err(ConfigurationError::UnexpectedShape(Shape::Subscriber))
        ));
    }
}
