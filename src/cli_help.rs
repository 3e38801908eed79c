//! Long help text constants for CLI subcommands.

/// Full weekly sync.
pub const SYNC: &str = "\
Sync last week's messages, aggregate them and publish the dashboard snapshot.

The target week is the last fully completed ISO week (Monday 00:00:00.000 UTC
to Sunday 23:59:59.999 UTC) before the current instant.

Steps:
  1. Skip the run if weekly_aggregate already holds rows for the week
  2. Read every configured channel newest-first down to the week's start
  3. Upsert raw messages (sender ids are replaced by a 16-char SHA-256 prefix)
  4. Re-read the week's stored messages and count them per route
  5. Upsert one weekly_aggregate row per route
  6. Atomically replace the snapshot file

If a channel fails, the raw rows of the other channels are kept but no
aggregates are written, so the next run retries the whole week. Use
--allow-partial to publish anyway.

Secrets come from the environment:
  SUPABASE_URL       store URL (overrides store.url)
  SUPABASE_KEY       store service key (or the variable named by store.key_env)
  TPULSE_CHAT_TOKEN  relay token (or the variable named by chat.token_env)

Examples:
  tpulse sync                      # weekly run
  tpulse sync --force              # rebuild an already synced week
  tpulse sync --dry-run --json     # read chats, write nothing";

/// Target window inspection.
pub const WINDOW: &str = "\
Show the week a sync would target.

Prints the ISO week key and the inclusive UTC bounds of the last completed
week before --at (default: now).

Examples:
  tpulse window
  tpulse window --at 2024-01-01T00:00:00Z   # 2023-W52
  tpulse window --json";
