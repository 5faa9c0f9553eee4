//! Session
//!
//! The operation surface a shell drives. Every mutating operation clones
//! the head snapshot into a working copy, transforms it, commits it and
//! only then hands it to the render bridge. Render failures are logged and
//! never touch history.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::identity::CommitId;
use crate::model::{
    Attribute, Machines, Project, SampleBank, SamplePool, SynthContext, Tags,
};
use crate::render::{Generator, RenderBridge};
use crate::state::store::clear_directory;
use crate::state::{Commit, CommitStore, LogEntry};

pub struct Session {
    config: EngineConfig,
    machines: Machines,
    pool: Box<dyn SamplePool>,
    tags: Tags,
    store: CommitStore,
    rng: StdRng,
    generators: Vec<Generator>,
    bridge: Option<Box<dyn RenderBridge>>,
}

impl Session {
    /// Build a session over an explicit sample pool. Nothing is fetched.
    pub fn new(config: EngineConfig, pool: Box<dyn SamplePool>) -> Result<Self> {
        config.validate()?;
        let machines = config.machines();
        let tags = Tags::new(&config.tracks, &config.terms);
        let store = CommitStore::new(config.store_dir.clone(), machines.clone());
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            machines,
            pool,
            tags,
            store,
            rng,
            generators: Generator::defaults(),
            bridge: None,
        })
    }

    /// Load the configured sample manifest, build the session and fetch
    /// persisted history.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let pool = match &config.samples {
            Some(path) => SampleBank::load(path)?,
            None => SampleBank::default(),
        };
        debug!("sample pool holds {} samples", pool.len());

        let mut session = Self::new(config, Box::new(pool))?;
        let loaded = session.store.fetch()?;
        info!("loaded {} commits from {}", loaded, session.store.root().display());
        Ok(session)
    }

    pub fn with_bridge(mut self, bridge: Box<dyn RenderBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_generators(mut self, generators: Vec<Generator>) -> Self {
        self.generators = generators;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &CommitStore {
        &self.store
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Reload history from disk.
    pub fn fetch(&mut self) -> Result<usize> {
        self.store.fetch()
    }

    /// Commit a freshly synthesized project of `n_patches` patches.
    pub fn randomize_project(&mut self) -> Result<CommitId> {
        let ctx = context(&self.config, &self.machines, self.pool.as_ref(), &self.tags);
        let project = Project::randomise(
            &self.config.tracks,
            self.config.n_patches,
            &ctx,
            &mut self.rng,
        )?;
        self.commit_and_render(project)
    }

    /// Apply `count` mutations of `attr` to every unfrozen patch at head.
    pub fn mutate(&mut self, attr: Attribute, count: usize) -> Result<CommitId> {
        let head = self.store.require_head()?.content();
        let ctx = context(&self.config, &self.machines, self.pool.as_ref(), &self.tags);
        let project = head.mutated(attr, count, &ctx, &mut self.rng)?;
        self.commit_and_render(project)
    }

    /// Keep only the indexed patches, frozen.
    pub fn select_patches(&mut self, indices: &[usize]) -> Result<CommitId> {
        let project = self.store.require_head()?.content().select(indices)?;
        self.commit_and_render(project)
    }

    /// Fill `n_patches` with clones of the indexed patches.
    pub fn clone_patches(&mut self, indices: &[usize]) -> Result<CommitId> {
        let project = self
            .store
            .require_head()?
            .content()
            .clone_patches(indices, self.config.n_patches)?;
        self.commit_and_render(project)
    }

    /// Phrase-based arrangement of the indexed patches.
    pub fn arrange(&mut self, indices: &[usize]) -> Result<CommitId> {
        let head = self.store.require_head()?.content();
        let project = head.arrange(indices, self.config.n_patches, &mut self.rng)?;
        self.commit_and_render(project)
    }

    /// Freeze the first `n` patches at head.
    pub fn freeze(&mut self, n: usize) -> Result<CommitId> {
        let mut project = self.store.require_head()?.content().clone();
        project.freeze(n);
        self.commit_and_render(project)
    }

    /// Re-commit the head snapshot as a new entry.
    pub fn commit_head(&mut self) -> Result<CommitId> {
        let project = self.store.require_head()?.content().clone();
        self.commit_and_render(project)
    }

    pub fn head(&self) -> Result<&Commit> {
        self.store.require_head()
    }

    pub fn log(&self) -> Vec<LogEntry> {
        self.store.log()
    }

    pub fn checkout(&mut self, key: &str) -> Result<CommitId> {
        self.store.require_head()?;
        let id = self.store.checkout(key)?;
        self.render(&id);
        Ok(id)
    }

    pub fn undo(&mut self) -> Result<CommitId> {
        Ok(self.store.undo()?.id().clone())
    }

    pub fn redo(&mut self) -> Result<CommitId> {
        Ok(self.store.redo()?.id().clone())
    }

    /// Wipe the commit store and any rendered files.
    pub fn clean(&mut self) -> Result<usize> {
        let mut removed = self.store.clean()?;
        if let Some(dir) = &self.config.render_dir {
            removed += clear_directory(dir)?;
        }
        Ok(removed)
    }

    pub fn show_tags(&self) -> String {
        self.tags.summary()
    }

    pub fn randomise_tags(&mut self) -> Result<String> {
        self.tags.randomise(&mut self.rng).validate()?;
        Ok(self.tags.summary())
    }

    pub fn reset_tags(&mut self) -> String {
        self.tags.reset();
        self.tags.summary()
    }

    fn commit_and_render(&mut self, project: Project) -> Result<CommitId> {
        let id = self.store.commit(project)?;
        self.render(&id);
        Ok(id)
    }

    /// Render head, writing the container when a render directory is set.
    fn render(&self, id: &CommitId) {
        let (Some(bridge), Some(head)) = (&self.bridge, self.store.head()) else {
            return;
        };

        let container = match bridge.render(
            head.content(),
            &self.generators,
            &self.config.levels(),
            &self.config.timing(),
        ) {
            Ok(container) => container,
            Err(e) => {
                warn!("render of {} failed: {}", id, e);
                return;
            }
        };

        if let Some(dir) = &self.config.render_dir {
            let path = dir.join(format!("{}.{}", id, bridge.extension()));
            match container.write_project(&path) {
                Ok(()) => debug!("rendered {}", path.display()),
                Err(e) => warn!("writing {} failed: {}", path.display(), e),
            }
        }
    }
}

fn context<'a>(
    config: &EngineConfig,
    machines: &'a Machines,
    pool: &'a dyn SamplePool,
    tags: &'a Tags,
) -> SynthContext<'a> {
    SynthContext {
        machines,
        pool,
        tags,
        n_sounds: config.n_sounds,
        cutoff: config.cutoff,
        mutation_limit: config.mutation_limit,
    }
}
