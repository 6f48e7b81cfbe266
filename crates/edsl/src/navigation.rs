//! Page navigation
//!
//! A [`Navigator`] owns the browser driver and remembers the page it last
//! created, so test steps can say "visit the login page", "on the home
//! page" or "if we are on the cart page".

use crate::config::EdslConfig;
use crate::container::{Container, ContainerOptions, ContainerType};
use crate::fixture::FixtureFetcher;
use crate::result::EdslResult;
use crate::value::{ObjectRef, Options};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Creates pages over one browser and tracks the current one
pub struct Navigator {
    browser: ObjectRef,
    config: EdslConfig,
    fixtures: Option<FixtureFetcher>,
    current: Option<Arc<Container>>,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("browser", &self.browser.type_name())
            .field("config", &self.config)
            .field("current", &self.current.as_ref().map(|page| page.type_name()))
            .finish()
    }
}

impl Navigator {
    #[must_use]
    pub fn new(browser: ObjectRef) -> Self {
        Self {
            browser,
            config: EdslConfig::default(),
            fixtures: None,
            current: None,
        }
    }

    /// Config handed to every page created from here
    #[must_use]
    pub fn with_config(mut self, config: EdslConfig) -> Self {
        self.config = config;
        self
    }

    /// Fixture source handed to every page created from here
    #[must_use]
    pub fn with_fixtures(mut self, fixtures: FixtureFetcher) -> Self {
        self.fixtures = Some(fixtures);
        self
    }

    #[must_use]
    pub const fn browser(&self) -> &ObjectRef {
        &self.browser
    }

    /// The page most recently created
    #[must_use]
    pub const fn current_page(&self) -> Option<&Arc<Container>> {
        self.current.as_ref()
    }

    /// Create a page of type `page` and navigate the browser to its URL.
    ///
    /// `params` are laid over the type's default URL parameters.
    pub fn visit(&mut self, page: &Arc<ContainerType>, params: Options) -> EdslResult<Arc<Container>> {
        let created = self.create(page, params);
        let _ = created.goto()?;
        self.current = Some(Arc::clone(&created));
        Ok(created)
    }

    /// Create a page of type `page` without navigating
    pub fn on(&mut self, page: &Arc<ContainerType>, params: Options) -> Arc<Container> {
        let created = self.create(page, params);
        self.current = Some(Arc::clone(&created));
        created
    }

    /// Re-create the current page only if it is of type `page`; otherwise
    /// return the current page unchanged.
    pub fn if_page(&mut self, page: &Arc<ContainerType>, params: Options) -> Option<Arc<Container>> {
        let on_it = self
            .current
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current.container_type(), page));
        if on_it {
            Some(self.on(page, params))
        } else {
            self.current.clone()
        }
    }

    fn create(&self, page: &Arc<ContainerType>, params: Options) -> Arc<Container> {
        debug!(page = page.name(), params = params.len(), "creating page");
        let mut options = ContainerOptions::new()
            .with_config(self.config.clone())
            .with_params(params);
        if let Some(fixtures) = &self.fixtures {
            options = options.with_fixtures(fixtures.clone());
        }
        Container::with_options(Arc::clone(page), Arc::clone(&self.browser), options)
    }
}
