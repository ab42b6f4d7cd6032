//! Verified, deduplicated, time-bounded view across many namespaces.
//!
//! Each avatar is resolved and walked independently; failures for one avatar
//! or one link are recorded and never stop the rest. Avatars are scanned
//! concurrently, so output order comes only from the final sort.

use std::collections::{BTreeSet, HashSet};

use alloy_primitives::{Address, B256};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use catena_core::{validate_link, CancellationToken, ContentAddress, Link, OrderKey, Profile};
use catena_log::{load_index, open_profile, ChunkWalker, LogError};
use catena_store::{BlobStore, ChainReader, NameRegistry};
use catena_verify::{NonceRegistry, ReplayScope, SignatureVerifier};

use crate::error::{AggregateError, Result, ScanError, ScanStage};
use crate::request::{AggregateRequest, AggregatorConfig};

/// A link that passed every check, with its place in the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedLink {
    /// Avatar whose namespace held the link.
    pub owner: Address,
    pub link: Link,
    pub position: usize,
    pub chunk: ContentAddress,
    /// Canonical identity hash, used for dedup and tie-breaks.
    pub identity: B256,
}

impl AcceptedLink {
    pub fn order_key(&self) -> OrderKey {
        OrderKey::new(self.link.signed_at, self.position, self.owner, self.identity)
    }
}

/// Result of an aggregation run.
#[derive(Debug, Clone, Default)]
pub struct AggregateOutput {
    /// Accepted links, deduplicated and in canonical order.
    pub links: Vec<AcceptedLink>,
    pub errors: Vec<ScanError>,
    /// Avatars whose namespace was found and walked, ascending.
    pub scanned: Vec<Address>,
}

struct AvatarScan {
    avatar: Address,
    scanned: bool,
    links: Vec<AcceptedLink>,
    errors: Vec<ScanError>,
}

impl AvatarScan {
    fn new(avatar: Address) -> Self {
        Self {
            avatar,
            scanned: false,
            links: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn record(&mut self, error: ScanError) {
        warn!(
            scope = %error.scope,
            stage = %error.stage,
            content_address = ?error.content_address.map(|a| a.to_hex()),
            message = %error.message,
            "scan error"
        );
        self.errors.push(error);
    }
}

struct ScanContext<'r> {
    avatar: Address,
    profile: Profile,
    request: &'r AggregateRequest,
    nonces: &'r NonceRegistry,
}

/// Walks many avatars' namespaces under one operator scope.
pub struct Aggregator<'a, B: ?Sized, R: ?Sized, C> {
    blobs: &'a B,
    registry: &'a R,
    verifier: &'a SignatureVerifier<C>,
    config: AggregatorConfig,
}

impl<'a, B, R, C> Aggregator<'a, B, R, C>
where
    B: BlobStore + ?Sized,
    R: NameRegistry + ?Sized,
    C: ChainReader,
{
    pub fn new(blobs: &'a B, registry: &'a R, verifier: &'a SignatureVerifier<C>) -> Self {
        Self {
            blobs,
            registry,
            verifier,
            config: AggregatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Run one aggregation.
    ///
    /// Nonces seen during the run are recorded in `nonces`; pass a fresh
    /// registry for an independent view.
    pub async fn run(
        &self,
        request: &AggregateRequest,
        nonces: &NonceRegistry,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutput> {
        request.validate()?;
        if cancel.is_cancelled() {
            return Err(AggregateError::Cancelled);
        }

        let avatars: BTreeSet<Address> = request.avatars.iter().copied().collect();
        info!(
            operator = %request.operator,
            avatars = avatars.len(),
            chain_id = request.chain_id,
            start = request.window.start,
            end = request.window.end,
            "starting aggregation"
        );

        let scans: Vec<Result<AvatarScan>> = stream::iter(avatars)
            .map(|avatar| self.scan_avatar(avatar, request, nonces, cancel))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut scans = scans.into_iter().collect::<Result<Vec<_>>>()?;
        scans.sort_by_key(|scan| scan.avatar);

        let mut output = AggregateOutput::default();
        for scan in scans {
            if scan.scanned {
                output.scanned.push(scan.avatar);
            }
            output.links.extend(scan.links);
            output.errors.extend(scan.errors);
        }

        output.links.sort_by_key(AcceptedLink::order_key);
        let mut seen = HashSet::new();
        output.links.retain(|accepted| seen.insert(accepted.identity));

        info!(
            operator = %request.operator,
            links = output.links.len(),
            errors = output.errors.len(),
            scanned = output.scanned.len(),
            "aggregation complete"
        );
        Ok(output)
    }

    async fn scan_avatar(
        &self,
        avatar: Address,
        request: &AggregateRequest,
        nonces: &NonceRegistry,
        cancel: &CancellationToken,
    ) -> Result<AvatarScan> {
        let mut scan = AvatarScan::new(avatar);
        let Some((profile, head)) = self.resolve(avatar, &request.operator, &mut scan).await else {
            return Ok(scan);
        };
        scan.scanned = true;

        let ctx = ScanContext {
            avatar,
            profile,
            request,
            nonces,
        };
        let mut walker = ChunkWalker::new(self.blobs, head)
            .with_max_chunks(self.config.max_chunks)
            .with_cancellation(cancel.clone());

        loop {
            match walker.next_chunk().await {
                Ok(Some((address, chunk))) => {
                    for (position, link) in chunk.ordered_newest_first() {
                        if cancel.is_cancelled() {
                            return Err(AggregateError::Cancelled);
                        }
                        match self.inspect(&ctx, address, position, link).await {
                            Ok(Some(accepted)) => scan.links.push(accepted),
                            Ok(None) => {}
                            Err(error) => scan.record(error),
                        }
                    }
                }
                Ok(None) => break,
                Err(LogError::Cancelled) => return Err(AggregateError::Cancelled),
                Err(err) => {
                    let mut error = ScanError::new(avatar, walk_stage(&err), err.to_string());
                    if let Some(address) = walker.current() {
                        error = error.at(address);
                    }
                    scan.record(error);
                    break;
                }
            }
        }

        debug!(
            avatar = %avatar,
            chunks = walker.visited(),
            accepted = scan.links.len(),
            errors = scan.errors.len(),
            "scanned avatar"
        );
        Ok(scan)
    }

    /// Registry pointer to profile to index head.
    ///
    /// `None` when the avatar has nothing to scan or a lookup failed.
    async fn resolve(
        &self,
        avatar: Address,
        key: &str,
        scan: &mut AvatarScan,
    ) -> Option<(Profile, Option<ContentAddress>)> {
        let profile = match open_profile(self.blobs, self.registry, &avatar).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!(avatar = %avatar, "avatar has no registry pointer");
                return None;
            }
            Err(err) => {
                scan.record(ScanError::new(avatar, ScanStage::Resolve, err.to_string()));
                return None;
            }
        };

        let Some(index_address) = profile.namespace(key) else {
            debug!(avatar = %avatar, key, "avatar has no namespace for operator");
            return None;
        };

        match load_index(self.blobs, &index_address).await {
            Ok(index) => Some((profile, index.head)),
            Err(err) => {
                scan.record(
                    ScanError::new(avatar, ScanStage::Resolve, err.to_string()).at(index_address),
                );
                None
            }
        }
    }

    /// Filter, replay-check, verify and authorize one link.
    ///
    /// `Ok(None)` is a silent skip.
    async fn inspect(
        &self,
        ctx: &ScanContext<'_>,
        chunk: ContentAddress,
        position: usize,
        link: &Link,
    ) -> std::result::Result<Option<AcceptedLink>, ScanError> {
        let request = ctx.request;
        if link.chain_id != request.chain_id {
            return Ok(None);
        }
        if !request.window.contains(link.signed_at, self.config.clock_skew_ms) {
            return Ok(None);
        }

        let fail = |stage: ScanStage, message: String| {
            ScanError::new(ctx.avatar, stage, format!("{}: {message}", link.name)).at(chunk)
        };

        validate_link(link, true).map_err(|e| fail(ScanStage::Parse, e.to_string()))?;
        let identity = link
            .identity_hash()
            .map_err(|e| fail(ScanStage::Parse, e.to_string()))?;

        let scope = ReplayScope::new(ctx.avatar, request.operator.clone(), link.signer_address);
        if !ctx.nonces.check_and_record(&scope, &link.nonce) {
            debug!(avatar = %ctx.avatar, name = %link.name, "dropping replayed nonce");
            return Ok(None);
        }

        match self.verifier.verify_link(link).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(avatar = %ctx.avatar, name = %link.name, "dropping invalid signature");
                return Ok(None);
            }
            Err(err) => return Err(fail(ScanStage::Verify, err.to_string())),
        }

        if !ctx
            .profile
            .is_authorized(&ctx.avatar, &link.signer_address, link.signed_at)
        {
            return Err(fail(
                ScanStage::Authorize,
                format!("signer {} not authorized", link.signer_address),
            ));
        }

        Ok(Some(AcceptedLink {
            owner: ctx.avatar,
            link: link.clone(),
            position,
            chunk,
            identity,
        }))
    }
}

fn walk_stage(err: &LogError) -> ScanStage {
    match err {
        LogError::Core(_) => ScanStage::Parse,
        _ => ScanStage::Fetch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TimeWindow;
    use catena_core::{Keypair, LinkBuilder, LinkSigner, SigningKeyWindow};
    use catena_log::{NamespaceWriter, WriterConfig};
    use async_trait::async_trait;
    use bytes::Bytes;
    use catena_store::{MemoryBlobStore, MemoryChain, MemoryRegistry};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const KEY: &str = "market";

    struct Env {
        blobs: Arc<MemoryBlobStore>,
        registry: Arc<MemoryRegistry>,
        verifier: SignatureVerifier<Arc<MemoryChain>>,
    }

    impl Env {
        fn new() -> Self {
            Self {
                blobs: Arc::new(MemoryBlobStore::new()),
                registry: Arc::new(MemoryRegistry::new()),
                verifier: SignatureVerifier::new(Arc::new(MemoryChain::new())),
            }
        }

        async fn writer(
            &self,
            owner: Address,
            capacity: usize,
        ) -> NamespaceWriter<Arc<MemoryBlobStore>, Arc<MemoryRegistry>> {
            NamespaceWriter::open(
                self.blobs.clone(),
                self.registry.clone(),
                owner,
                KEY,
                WriterConfig::new(1).with_chunk_capacity(capacity),
            )
            .await
            .unwrap()
        }

        async fn publish(&self, signer: &LinkSigner, links: Vec<Link>) {
            self.writer(signer.address(), 64)
                .await
                .write_batch(links)
                .await
                .unwrap();
        }

        fn aggregator(&self) -> Aggregator<'_, MemoryBlobStore, MemoryRegistry, Arc<MemoryChain>> {
            Aggregator::new(self.blobs.as_ref(), self.registry.as_ref(), &self.verifier)
        }

        async fn run(&self, avatars: Vec<Address>, window: TimeWindow) -> AggregateOutput {
            self.run_with(AggregatorConfig::default(), avatars, window).await
        }

        async fn run_with(
            &self,
            config: AggregatorConfig,
            avatars: Vec<Address>,
            window: TimeWindow,
        ) -> AggregateOutput {
            let request = AggregateRequest::new(KEY, avatars, 1, window);
            self.aggregator()
                .with_config(config)
                .run(&request, &NonceRegistry::new(), &CancellationToken::new())
                .await
                .unwrap()
        }
    }

    fn seller(seed: u8) -> LinkSigner {
        LinkSigner::plain(Keypair::from_seed(&[seed; 32]).unwrap())
    }

    fn link(signer: &LinkSigner, name: &str, signed_at: i64) -> Link {
        LinkBuilder::new(name, ContentAddress::digest(name.as_bytes()), 1)
            .signed_at(signed_at)
            .sign(signer)
            .unwrap()
    }

    fn names(output: &AggregateOutput) -> Vec<&str> {
        output.links.iter().map(|a| a.link.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_window_edges_with_skew() {
        let env = Env::new();
        let a = seller(1);
        env.publish(
            &a,
            vec![
                link(&a, "items/before", 99),
                link(&a, "items/start", 100),
                link(&a, "items/skew-edge", 250),
                link(&a, "items/beyond", 251),
            ],
        )
        .await;

        let config = AggregatorConfig {
            clock_skew_ms: 50,
            ..AggregatorConfig::default()
        };
        let output = env
            .run_with(config, vec![a.address()], TimeWindow::new(100, 200))
            .await;
        assert_eq!(names(&output), vec!["items/skew-edge", "items/start"]);
        assert!(output.errors.is_empty());
    }

    #[tokio::test]
    async fn test_chain_mismatch_is_skipped() {
        let env = Env::new();
        let a = seller(1);
        let other_chain = LinkBuilder::new("items/l2", ContentAddress::digest(b"l2"), 10)
            .signed_at(5)
            .sign(&a)
            .unwrap();
        env.publish(&a, vec![link(&a, "items/l1", 4), other_chain]).await;

        let output = env.run(vec![a.address()], TimeWindow::new(0, 100)).await;
        assert_eq!(names(&output), vec!["items/l1"]);
    }

    /// Delays the profile fetch of each avatar so scans finish in a chosen order.
    struct StaggeredBlobs {
        inner: Arc<MemoryBlobStore>,
        delays: HashMap<ContentAddress, Duration>,
        finished: Mutex<Vec<ContentAddress>>,
    }

    #[async_trait]
    impl BlobStore for StaggeredBlobs {
        async fn put(&self, bytes: Bytes) -> catena_store::Result<ContentAddress> {
            self.inner.put(bytes).await
        }

        async fn get(&self, address: &ContentAddress) -> catena_store::Result<Bytes> {
            if let Some(delay) = self.delays.get(address) {
                tokio::time::sleep(*delay).await;
                self.finished.lock().unwrap().push(*address);
            }
            self.inner.get(address).await
        }
    }

    /// Run with scans completing in `finish_order`; returns the output and
    /// the profiles in the order their fetches actually completed.
    async fn run_finishing_in(
        env: &Env,
        finish_order: &[Address],
        window: TimeWindow,
    ) -> (AggregateOutput, Vec<ContentAddress>, Vec<ContentAddress>) {
        let mut profiles = Vec::new();
        for avatar in finish_order {
            profiles.push(env.registry.get_pointer(avatar).await.unwrap().unwrap());
        }
        let delays = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (*p, Duration::from_millis(10 + 15 * i as u64)))
            .collect();
        let blobs = StaggeredBlobs {
            inner: env.blobs.clone(),
            delays,
            finished: Mutex::new(Vec::new()),
        };

        let mut avatars = finish_order.to_vec();
        avatars.sort();
        let request = AggregateRequest::new(KEY, avatars, 1, window);
        let output = Aggregator::new(&blobs, env.registry.as_ref(), &env.verifier)
            .run(&request, &NonceRegistry::new(), &CancellationToken::new())
            .await
            .unwrap();
        let finished = blobs.finished.into_inner().unwrap();
        (output, finished, profiles)
    }

    #[tokio::test]
    async fn test_order_independent_of_arrival() {
        let env = Env::new();
        let sellers: Vec<LinkSigner> = (1..=5).map(seller).collect();
        for (i, s) in sellers.iter().enumerate() {
            let t = i as i64;
            env.publish(
                s,
                vec![link(s, "items/x", 10 + t), link(s, "items/y", 20 - t), link(s, "items/z", 15)],
            )
            .await;
        }
        let mut ascending: Vec<Address> = sellers.iter().map(|s| s.address()).collect();
        ascending.sort();
        let mut descending = ascending.clone();
        descending.reverse();

        let window = TimeWindow::new(0, 100);
        let (first_done_first, finished, expected) =
            run_finishing_in(&env, &ascending, window).await;
        assert_eq!(finished, expected);
        let (first_done_last, finished, expected) =
            run_finishing_in(&env, &descending, window).await;
        assert_eq!(finished, expected);

        let identities = |o: &AggregateOutput| o.links.iter().map(|a| a.identity).collect::<Vec<_>>();
        assert_eq!(first_done_first.links.len(), 15);
        assert_eq!(identities(&first_done_first), identities(&first_done_last));
        assert_eq!(first_done_first.scanned, first_done_last.scanned);
        assert_eq!(first_done_first.errors, first_done_last.errors);

        let keys: Vec<OrderKey> = first_done_first.links.iter().map(AcceptedLink::order_key).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_tie_breaks_on_owner_then_identity() {
        let env = Env::new();
        let a = seller(1);
        let b = seller(2);

        // Capacity 1 puts both of A's links at position 0 in separate chunks
        let mut writer = env.writer(a.address(), 1).await;
        writer
            .write_batch(vec![link(&a, "items/p", 7), link(&a, "items/q", 7)])
            .await
            .unwrap();
        env.publish(&b, vec![link(&b, "items/r", 7)]).await;

        let output = env
            .run(vec![a.address(), b.address()], TimeWindow::new(0, 10))
            .await;
        assert_eq!(output.links.len(), 3);

        let (low, high) = if a.address() < b.address() { (a.address(), b.address()) } else { (b.address(), a.address()) };
        let owners: Vec<Address> = output.links.iter().map(|l| l.owner).collect();
        let first_owner = owners[0];
        assert_eq!(first_owner, low);
        assert_eq!(owners[2], high);

        let same_owner: Vec<&AcceptedLink> = output.links.iter().filter(|l| l.owner == a.address()).collect();
        assert!(same_owner[0].identity < same_owner[1].identity);
    }

    #[tokio::test]
    async fn test_replay_within_scope_keeps_newest() {
        let env = Env::new();
        let a = seller(1);
        let replay = |name: &str, at: i64| {
            LinkBuilder::new(name, ContentAddress::digest(b"x"), 1)
                .signed_at(at)
                .nonce("feedface")
                .sign(&a)
                .unwrap()
        };
        env.publish(&a, vec![replay("items/first", 1), replay("items/second", 2)])
            .await;

        let output = env.run(vec![a.address()], TimeWindow::new(0, 10)).await;
        assert_eq!(names(&output), vec!["items/second"]);
        assert!(output.errors.is_empty());
    }

    #[tokio::test]
    async fn test_forged_link_dropped_silently() {
        let env = Env::new();
        let a = seller(1);
        let mut forged = link(&a, "items/forged", 3);
        forged.signed_at = 4;
        env.publish(&a, vec![link(&a, "items/ok", 2), forged]).await;

        let output = env.run(vec![a.address()], TimeWindow::new(0, 10)).await;
        assert_eq!(names(&output), vec!["items/ok"]);
        assert!(output.errors.is_empty());
    }

    #[tokio::test]
    async fn test_delegate_requires_authorization() {
        let env = Env::new();
        let a = seller(1);
        let delegate = seller(9);

        env.publish(&a, vec![link(&delegate, "items/delegated", 5)]).await;
        let output = env.run(vec![a.address()], TimeWindow::new(0, 10)).await;
        assert!(output.links.is_empty());
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].stage, ScanStage::Authorize);

        let mut writer = env.writer(a.address(), 64).await;
        writer
            .authorize_signing_key(SigningKeyWindow {
                address: delegate.address(),
                valid_from: 0,
                valid_until: None,
            })
            .unwrap();
        writer.flush().await.unwrap();

        let output = env.run(vec![a.address()], TimeWindow::new(0, 10)).await;
        assert_eq!(names(&output), vec!["items/delegated"]);
        assert_eq!(output.links[0].owner, a.address());
    }

    #[tokio::test]
    async fn test_same_link_under_two_avatars_dedups() {
        let env = Env::new();
        let a = seller(1);
        let b = seller(2);
        let delegate = seller(9);
        let shared = link(&delegate, "items/shared", 5);

        for owner in [&a, &b] {
            let mut writer = env.writer(owner.address(), 64).await;
            writer
                .authorize_signing_key(SigningKeyWindow {
                    address: delegate.address(),
                    valid_from: 0,
                    valid_until: None,
                })
                .unwrap();
            writer.write(shared.clone()).await.unwrap();
        }

        let output = env
            .run(vec![a.address(), b.address()], TimeWindow::new(0, 10))
            .await;
        assert_eq!(output.links.len(), 1);
        assert_eq!(output.links[0].owner, a.address().min(b.address()));
    }

    #[tokio::test]
    async fn test_failures_recorded_per_avatar() {
        let env = Env::new();
        let a = seller(1);
        let b = seller(2);
        let c = seller(3);
        env.publish(&a, vec![link(&a, "items/a", 1)]).await;
        env.publish(&b, vec![link(&b, "items/b", 1)]).await;

        // Corrupt B's head chunk
        let head = catena_log::open_index(env.blobs.as_ref(), env.registry.as_ref(), &b.address(), KEY)
            .await
            .unwrap()
            .unwrap()
            .head
            .unwrap();
        env.blobs.corrupt(head, &b"not json"[..]).unwrap();

        // C's pointer goes nowhere
        env.registry
            .update_pointer(&c.address(), ContentAddress::digest(b"missing"))
            .await
            .unwrap();

        let output = env
            .run(vec![a.address(), b.address(), c.address()], TimeWindow::new(0, 10))
            .await;
        assert_eq!(names(&output), vec!["items/a"]);
        assert_eq!(output.errors.len(), 2);

        let parse = output.errors.iter().find(|e| e.scope == b.address()).unwrap();
        assert_eq!(parse.stage, ScanStage::Parse);
        assert_eq!(parse.content_address, Some(head));

        let resolve = output.errors.iter().find(|e| e.scope == c.address()).unwrap();
        assert_eq!(resolve.stage, ScanStage::Resolve);

        let mut expected = vec![a.address(), b.address()];
        expected.sort();
        assert_eq!(output.scanned, expected);
    }

    #[tokio::test]
    async fn test_unpublished_avatar_not_scanned() {
        let env = Env::new();
        let output = env.run(vec![seller(4).address()], TimeWindow::new(0, 10)).await;
        assert!(output.links.is_empty());
        assert!(output.errors.is_empty());
        assert!(output.scanned.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run() {
        let env = Env::new();
        let a = seller(1);
        env.publish(&a, vec![link(&a, "items/a", 1)]).await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = AggregateRequest::new(KEY, vec![a.address()], 1, TimeWindow::new(0, 10));
        let result = env
            .aggregator()
            .run(&request, &NonceRegistry::new(), &cancel)
            .await;
        assert!(matches!(result, Err(AggregateError::Cancelled)));
    }

    /// Cancels `cancel` once the `after`-th blob has been fetched.
    struct CancelAfterGets {
        inner: Arc<MemoryBlobStore>,
        cancel: CancellationToken,
        after: usize,
        gets: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl BlobStore for CancelAfterGets {
        async fn put(&self, bytes: Bytes) -> catena_store::Result<ContentAddress> {
            self.inner.put(bytes).await
        }

        async fn get(&self, address: &ContentAddress) -> catena_store::Result<Bytes> {
            let bytes = self.inner.get(address).await;
            let seen = self.gets.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if seen == self.after {
                self.cancel.cancel();
            }
            bytes
        }
    }

    #[tokio::test]
    async fn test_cancel_observed_between_links() {
        let env = Env::new();
        let a = seller(1);
        env.publish(
            &a,
            vec![link(&a, "items/a", 1), link(&a, "items/b", 2), link(&a, "items/c", 3)],
        )
        .await;

        // Profile, index, then the only chunk: cancel lands after the chunk is loaded
        let cancel = CancellationToken::new();
        let blobs = CancelAfterGets {
            inner: env.blobs.clone(),
            cancel: cancel.clone(),
            after: 3,
            gets: std::sync::atomic::AtomicUsize::new(0),
        };
        let request = AggregateRequest::new(KEY, vec![a.address()], 1, TimeWindow::new(0, 10));
        let nonces = NonceRegistry::new();
        let result = Aggregator::new(&blobs, env.registry.as_ref(), &env.verifier)
            .run(&request, &nonces, &cancel)
            .await;
        assert!(matches!(result, Err(AggregateError::Cancelled)));
    }
}
