//! A store wrapper for tests: delegates to an in-memory [`SqliteStore`]
//! while counting calls and injecting failures on demand.

use std::sync::{
  Mutex, PoisonError,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use newsfeed_core::{
  filters::{ContentFilters, ContentFiltersPatch},
  preferences::{
    PreferenceValue, PreferencesPatch, PreferencesWithFilters, UserPreferences,
  },
  store::{MigrationStore, PreferenceStatistics, PreferenceStore, StoreError},
};
use newsfeed_store_sqlite::SqliteStore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestStoreError {
  #[error(transparent)]
  Store(#[from] newsfeed_store_sqlite::Error),

  #[error("injected failure: {0}")]
  Injected(&'static str),
}

impl StoreError for TestStoreError {
  fn is_conflict(&self) -> bool {
    matches!(self, Self::Store(e) if e.is_conflict())
  }
}

type Result<T> = std::result::Result<T, TestStoreError>;

pub struct InstrumentedStore {
  inner:          SqliteStore,
  calls:          AtomicUsize,
  writes:         AtomicUsize,
  bulk_calls:     AtomicUsize,
  fail_reads:     AtomicBool,
  /// 1-based index of the bulk update call that fails; 0 for none.
  fail_bulk_call: AtomicUsize,
  fail_create:    Mutex<Option<String>>,
}

impl InstrumentedStore {
  pub async fn new() -> Self {
    Self {
      inner:          SqliteStore::open_in_memory().await.unwrap(),
      calls:          AtomicUsize::new(0),
      writes:         AtomicUsize::new(0),
      bulk_calls:     AtomicUsize::new(0),
      fail_reads:     AtomicBool::new(false),
      fail_bulk_call: AtomicUsize::new(0),
      fail_create:    Mutex::new(None),
    }
  }

  pub fn inner(&self) -> &SqliteStore { &self.inner }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  pub fn writes(&self) -> usize { self.writes.load(Ordering::SeqCst) }

  pub fn bulk_calls(&self) -> usize { self.bulk_calls.load(Ordering::SeqCst) }

  pub fn fail_reads(&self, on: bool) { self.fail_reads.store(on, Ordering::SeqCst) }

  pub fn fail_bulk_call(&self, n: usize) { self.fail_bulk_call.store(n, Ordering::SeqCst) }

  pub fn fail_create_for(&self, user_id: &str) {
    *self.fail_create.lock().unwrap_or_else(PoisonError::into_inner) =
      Some(user_id.to_owned());
  }

  fn read(&self) -> Result<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(TestStoreError::Injected("read"));
    }
    Ok(())
  }

  fn write(&self) {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.writes.fetch_add(1, Ordering::SeqCst);
  }

  fn create(&self, user_id: &str) -> Result<()> {
    self.write();
    let fail = self.fail_create.lock().unwrap_or_else(PoisonError::into_inner);
    if fail.as_deref() == Some(user_id) {
      return Err(TestStoreError::Injected("create"));
    }
    Ok(())
  }
}

impl PreferenceStore for InstrumentedStore {
  type Error = TestStoreError;

  async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
    self.read()?;
    Ok(self.inner.get_preferences(user_id).await?)
  }

  async fn get_content_filters(&self, user_id: &str) -> Result<Option<ContentFilters>> {
    self.read()?;
    Ok(self.inner.get_content_filters(user_id).await?)
  }

  async fn get_preferences_with_filters(
    &self,
    user_id: &str,
  ) -> Result<Option<PreferencesWithFilters>> {
    self.read()?;
    Ok(self.inner.get_preferences_with_filters(user_id).await?)
  }

  async fn preferences_exist(&self, user_id: &str) -> Result<bool> {
    self.read()?;
    Ok(self.inner.preferences_exist(user_id).await?)
  }

  async fn find_by_field(&self, value: PreferenceValue) -> Result<Vec<UserPreferences>> {
    self.read()?;
    Ok(self.inner.find_by_field(value).await?)
  }

  async fn create_preferences(
    &self,
    user_id: &str,
    patch: &PreferencesPatch,
  ) -> Result<UserPreferences> {
    self.create(user_id)?;
    Ok(self.inner.create_preferences(user_id, patch).await?)
  }

  async fn create_preferences_with_filters(
    &self,
    user_id: &str,
    preferences: &PreferencesPatch,
    filters: &ContentFiltersPatch,
  ) -> Result<PreferencesWithFilters> {
    self.create(user_id)?;
    Ok(
      self
        .inner
        .create_preferences_with_filters(user_id, preferences, filters)
        .await?,
    )
  }

  async fn update_preferences(
    &self,
    user_id: &str,
    patch: &PreferencesPatch,
  ) -> Result<Option<UserPreferences>> {
    self.write();
    Ok(self.inner.update_preferences(user_id, patch).await?)
  }

  async fn update_content_filters(
    &self,
    user_id: &str,
    patch: &ContentFiltersPatch,
  ) -> Result<Option<ContentFilters>> {
    self.write();
    Ok(self.inner.update_content_filters(user_id, patch).await?)
  }

  async fn delete_preferences(&self, user_id: &str) -> Result<bool> {
    self.write();
    Ok(self.inner.delete_preferences(user_id).await?)
  }
}

impl MigrationStore for InstrumentedStore {
  async fn find_preferences_for_users(
    &self,
    user_ids: &[String],
  ) -> Result<Vec<UserPreferences>> {
    self.read()?;
    Ok(self.inner.find_preferences_for_users(user_ids).await?)
  }

  async fn find_users_without_preferences(&self) -> Result<Vec<String>> {
    self.read()?;
    Ok(self.inner.find_users_without_preferences().await?)
  }

  async fn bulk_update_preferences(
    &self,
    user_ids: &[String],
    patch: &PreferencesPatch,
  ) -> Result<u64> {
    self.write();
    let call = self.bulk_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if call == self.fail_bulk_call.load(Ordering::SeqCst) {
      return Err(TestStoreError::Injected("bulk update"));
    }
    Ok(self.inner.bulk_update_preferences(user_ids, patch).await?)
  }

  async fn preference_statistics(&self) -> Result<PreferenceStatistics> {
    self.read()?;
    Ok(self.inner.preference_statistics().await?)
  }
}
