//! [`SqliteStore`] — the SQLite implementation of [`AccountStore`] and
//! [`PermissionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use furlough_core::{
  account::{Account, NewAccount, Role},
  permission::{NewPermission, Permission, PermissionDetails, PermissionStatus},
  store::{AccountQuery, AccountStore, PermissionQuery, PermissionStore},
};

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, PERMISSION_COLUMNS, RawAccount, RawPermission, encode_dt,
    encode_role, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Furlough store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-row `UPDATE`/`DELETE` and report whether a row matched.
  async fn execute_one(&self, sql: &'static str, params: Vec<Value>) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(sql, rusqlite::params_from_iter(params))?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn fetch_permission(&self, id: Uuid) -> Result<Option<Permission>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPermission> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PERMISSION_COLUMNS}
               FROM permissions p JOIN accounts a ON a.account_id = p.account_id
               WHERE p.permission_id = ?1"
            ),
            rusqlite::params![id_str],
            RawPermission::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPermission::into_permission).transpose()
  }
}

/// `WHERE` clause builder: a list of conditions plus their positional values.
#[derive(Default)]
struct Filter {
  conds:  Vec<String>,
  params: Vec<Value>,
}

impl Filter {
  fn push(&mut self, cond: impl Into<String>, params: impl IntoIterator<Item = Value>) {
    self.conds.push(cond.into());
    self.params.extend(params);
  }

  fn where_clause(&self) -> String {
    if self.conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conds.join(" AND "))
    }
  }
}

fn text(s: impl Into<String>) -> Value { Value::Text(s.into()) }

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  async fn insert_account(&self, input: NewAccount) -> Result<Option<Account>> {
    let account = Account {
      account_id:    Uuid::new_v4(),
      name:          input.name,
      email:         input.email,
      password_hash: input.password_hash,
      role:          input.role,
      verified:      input.verified,
      created_at:    Utc::now(),
    };

    let params = vec![
      text(encode_uuid(account.account_id)),
      text(account.name.clone()),
      text(account.name.to_lowercase()),
      text(account.email.clone()),
      text(account.password_hash.clone()),
      text(encode_role(account.role)),
      Value::Integer(i64::from(account.verified)),
      text(encode_dt(account.created_at)),
    ];

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO accounts (
             account_id, name, name_folded, email, password_hash, role,
             verified, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params_from_iter(params),
        ) {
          Ok(_) => Ok(true),
          // `email` is the only UNIQUE column on `accounts`.
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(inserted.then_some(account))
  }

  async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
            rusqlite::params![id_str],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn find_account_by_email(&self, email: String) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
            rusqlite::params![email],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn list_accounts(&self, query: AccountQuery) -> Result<(Vec<Account>, u64)> {
    let mut filter = Filter::default();

    if query.roles.is_empty() {
      filter.conds.push("0".to_owned());
    } else {
      let placeholders = vec!["?"; query.roles.len()].join(", ");
      filter.push(
        format!("role IN ({placeholders})"),
        query.roles.iter().map(|r| text(encode_role(*r))),
      );
    }
    // SQLite's lower() folds ASCII only, so both sides use Rust's folding.
    if let Some(search) = &query.search {
      filter.push("instr(name_folded, ?) > 0", [text(search.to_lowercase())]);
    }
    if let Some(verified) = query.verified {
      filter.push("verified = ?", [Value::Integer(i64::from(verified))]);
    }

    let where_clause = filter.where_clause();
    let direction    = query.order.as_sql();
    let count_sql    = format!("SELECT COUNT(*) FROM accounts {where_clause}");
    let select_sql   = format!(
      "SELECT {ACCOUNT_COLUMNS} FROM accounts {where_clause}
       ORDER BY created_at {direction}, rowid {direction}
       LIMIT ? OFFSET ?"
    );

    let count_params = filter.params.clone();
    let mut select_params = filter.params;
    select_params.push(Value::Integer(to_i64(query.limit)));
    select_params.push(Value::Integer(to_i64(query.offset)));

    let (raws, total): (Vec<RawAccount>, i64) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(count_params),
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&select_sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(select_params), RawAccount::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let accounts = raws
      .into_iter()
      .map(RawAccount::into_account)
      .collect::<Result<_>>()?;
    Ok((accounts, total.max(0) as u64))
  }

  async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<bool> {
    self
      .execute_one(
        "UPDATE accounts SET password_hash = ?1 WHERE account_id = ?2",
        vec![text(password_hash), text(encode_uuid(id))],
      )
      .await
  }

  async fn set_role(&self, id: Uuid, role: Role, verified: bool) -> Result<bool> {
    self
      .execute_one(
        "UPDATE accounts SET role = ?1, verified = ?2 WHERE account_id = ?3",
        vec![
          text(encode_role(role)),
          Value::Integer(i64::from(verified)),
          text(encode_uuid(id)),
        ],
      )
      .await
  }

  async fn set_verified(&self, id: Uuid, verified: bool) -> Result<bool> {
    self
      .execute_one(
        "UPDATE accounts SET verified = ?1 WHERE account_id = ?2",
        vec![Value::Integer(i64::from(verified)), text(encode_uuid(id))],
      )
      .await
  }
}

// ─── PermissionStore impl ────────────────────────────────────────────────────

impl PermissionStore for SqliteStore {
  type Error = Error;

  async fn insert_permission(&self, input: NewPermission) -> Result<Permission> {
    let id      = Uuid::new_v4();
    let id_str  = encode_uuid(id);
    let now     = encode_dt(Utc::now());
    let details = input.details;

    let params = vec![
      text(id_str.clone()),
      text(encode_uuid(input.account_id)),
      text(details.title),
      text(details.reason),
      text(encode_dt(details.start_date)),
      text(encode_dt(details.end_date)),
      text(encode_status(PermissionStatus::Pending)),
      text(now.clone()),
      text(now),
    ];

    // Read back through the join so the owner summary is populated.
    let raw: RawPermission = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO permissions (
             permission_id, account_id, title, reason, start_date, end_date,
             status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params_from_iter(params),
        )?;
        Ok(conn.query_row(
          &format!(
            "SELECT {PERMISSION_COLUMNS}
             FROM permissions p JOIN accounts a ON a.account_id = p.account_id
             WHERE p.permission_id = ?1"
          ),
          rusqlite::params![id_str],
          RawPermission::from_row,
        )?)
      })
      .await?;

    raw.into_permission()
  }

  async fn get_permission(&self, id: Uuid) -> Result<Option<Permission>> {
    self.fetch_permission(id).await
  }

  async fn list_permissions_for_account(&self, account_id: Uuid) -> Result<Vec<Permission>> {
    let id_str = encode_uuid(account_id);

    let raws: Vec<RawPermission> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERMISSION_COLUMNS}
           FROM permissions p JOIN accounts a ON a.account_id = p.account_id
           WHERE p.account_id = ?1
           ORDER BY p.created_at DESC, p.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawPermission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPermission::into_permission).collect()
  }

  async fn list_permissions_for_accounts(
    &self,
    account_ids: Vec<Uuid>,
  ) -> Result<Vec<Permission>> {
    if account_ids.is_empty() {
      return Ok(Vec::new());
    }

    let placeholders = vec!["?"; account_ids.len()].join(", ");
    let sql = format!(
      "SELECT {PERMISSION_COLUMNS}
       FROM permissions p JOIN accounts a ON a.account_id = p.account_id
       WHERE p.account_id IN ({placeholders})
       ORDER BY p.created_at DESC, p.rowid DESC"
    );
    let params: Vec<Value> =
      account_ids.into_iter().map(|id| text(encode_uuid(id))).collect();

    let raws: Vec<RawPermission> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawPermission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPermission::into_permission).collect()
  }

  async fn list_permissions(&self, query: PermissionQuery) -> Result<(Vec<Permission>, u64)> {
    let mut filter = Filter::default();
    if let Some(status) = query.status {
      filter.push("p.status = ?", [text(encode_status(status))]);
    }

    let where_clause = filter.where_clause();
    let direction    = query.order.as_sql();
    let count_sql    = format!("SELECT COUNT(*) FROM permissions p {where_clause}");
    let select_sql   = format!(
      "SELECT {PERMISSION_COLUMNS}
       FROM permissions p JOIN accounts a ON a.account_id = p.account_id
       {where_clause}
       ORDER BY p.created_at {direction}, p.rowid {direction}
       LIMIT ? OFFSET ?"
    );

    let count_params = filter.params.clone();
    let mut select_params = filter.params;
    select_params.push(Value::Integer(to_i64(query.limit)));
    select_params.push(Value::Integer(to_i64(query.offset)));

    let (raws, total): (Vec<RawPermission>, i64) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(count_params),
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&select_sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(select_params), RawPermission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let permissions = raws
      .into_iter()
      .map(RawPermission::into_permission)
      .collect::<Result<_>>()?;
    Ok((permissions, total.max(0) as u64))
  }

  async fn update_permission_details(
    &self,
    id:      Uuid,
    details: PermissionDetails,
  ) -> Result<bool> {
    self
      .execute_one(
        "UPDATE permissions
         SET title = ?1, reason = ?2, start_date = ?3, end_date = ?4,
             updated_at = ?5
         WHERE permission_id = ?6",
        vec![
          text(details.title),
          text(details.reason),
          text(encode_dt(details.start_date)),
          text(encode_dt(details.end_date)),
          text(encode_dt(Utc::now())),
          text(encode_uuid(id)),
        ],
      )
      .await
  }

  async fn set_permission_status(
    &self,
    id:      Uuid,
    status:  PermissionStatus,
    comment: String,
  ) -> Result<bool> {
    self
      .execute_one(
        "UPDATE permissions
         SET status = ?1, comment = ?2, updated_at = ?3
         WHERE permission_id = ?4",
        vec![
          text(encode_status(status)),
          text(comment),
          text(encode_dt(Utc::now())),
          text(encode_uuid(id)),
        ],
      )
      .await
  }

  async fn delete_permission(&self, id: Uuid) -> Result<bool> {
    self
      .execute_one(
        "DELETE FROM permissions WHERE permission_id = ?1",
        vec![text(encode_uuid(id))],
      )
      .await
  }
}

/// SQLite integers are signed; page arithmetic never approaches the limit.
fn to_i64(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }
