//  Tyriabot - A Guild Wars 2 and moderation bot for Discord.
//  Copyright (C) 2020 Nick Samson

//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.

//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.

//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Contains functionality related to the module system.
//! Modules represent functionality for Tyriabot, and will generally either process events from the server,
//! process commands from users, or some combination of the two.

use std::collections::HashSet;
use std::sync::Arc;

use crate::modules::commands::Command;
use crate::modules::hook::{BanHookFn, CommandHookFn, MemberJoinHookFn, ReadyHookFn};

pub mod base_hooks;
pub mod commands;
pub mod config;
pub mod gw2;
pub mod help;
pub mod hook;
pub mod mod_log;
pub mod privilege;
pub mod prune;
pub mod raid_protect;

/// Category for modules that don't declare one.
pub const DEFAULT_CATEGORY: &str = "General";

/// An integrated unit of functionality. A module may have a command associated with it,
/// and one or more hooks.
pub struct Module {
    name: String,
    description: &'static str,
    category: &'static str,
    command_handler: Option<Arc<dyn Command>>,
    command_hooks: Vec<CommandHookFn>,
    member_join_hooks: Vec<MemberJoinHookFn>,
    ban_hooks: Vec<BanHookFn>,
    ready_hooks: Vec<ReadyHookFn>,
    config_values: Vec<config::Value>,
    dependencies: HashSet<String>,
    sensitive: bool,
    owner_only: bool,
}

impl Module {
    /// Creates a new module with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut o = Module {
            name: name.into(),
            description: "",
            category: DEFAULT_CATEGORY,
            command_hooks: Vec::new(),
            member_join_hooks: Vec::new(),
            ban_hooks: Vec::new(),
            ready_hooks: Vec::new(),
            command_handler: None,
            config_values: Vec::new(),
            dependencies: HashSet::new(),
            sensitive: true,
            owner_only: false,
        };

        o.dependencies.insert("base_hooks".to_string());
        o
    }

    /// Clears all dependencies from a module.
    pub fn clear_dependencies(mut self) -> Self {
        self.dependencies.clear();
        self
    }

    /// Sets the sensitivity for the module.
    pub fn with_sensitivity(mut self, is_sensitive: bool) -> Self {
        self.sensitive = is_sensitive;
        self
    }

    /// Restricts the module to the bot owner.
    pub fn with_owner_only(mut self, owner_only: bool) -> Self {
        self.owner_only = owner_only;
        self
    }

    /// Sets the help category.
    pub fn with_category(mut self, category: &'static str) -> Self {
        self.category = category;
        self
    }

    /// Sets the one-line description shown in the command list.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Adds a command hook to the current module.
    pub fn with_command_hook(mut self, f: CommandHookFn) -> Self {
        self.command_hooks.push(f);
        self
    }

    /// Adds a hook run whenever a member joins a guild.
    pub fn with_member_join_hook(mut self, f: MemberJoinHookFn) -> Self {
        self.member_join_hooks.push(f);
        self
    }

    /// Adds a hook run on bans and unbans.
    pub fn with_ban_hook(mut self, f: BanHookFn) -> Self {
        self.ban_hooks.push(f);
        self
    }

    /// Adds a hook run once the bot is first ready.
    pub fn with_ready_hook(mut self, f: ReadyHookFn) -> Self {
        self.ready_hooks.push(f);
        self
    }

    /// Sets the command handler for the current module.
    pub fn with_command<T: Command + 'static>(mut self, cmd: T) -> Self {
        let ptr: Arc<dyn Command> = Arc::new(cmd);
        self.command_handler = Some(ptr);
        self
    }

    /// Associates a [Value][config::Value] with this module.
    pub fn with_config_value(mut self, v: config::Value) -> Self {
        self.config_values.push(v);
        self
    }

    /// Associates a module with another module as a dependency.
    pub fn with_dependency(mut self, d: impl Into<String>) -> Self {
        self.dependencies.insert(d.into());
        self
    }

    /// Accessor for associated config values.
    pub fn config_values(&self) -> &[config::Value] {
        &self.config_values
    }

    /// Accessor for the name of the module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description of the module.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// The help category of the module.
    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Accessor for the command handler, if any.
    pub fn command_handler(&self) -> Option<&Arc<dyn Command>> {
        self.command_handler.as_ref()
    }

    /// Accessor for any command hooks held in the Module.
    pub fn command_hooks(&self) -> &[CommandHookFn] {
        &self.command_hooks
    }

    #[doc(hidden)]
    pub fn member_join_hooks(&self) -> &[MemberJoinHookFn] {
        &self.member_join_hooks
    }

    #[doc(hidden)]
    pub fn ban_hooks(&self) -> &[BanHookFn] {
        &self.ban_hooks
    }

    #[doc(hidden)]
    pub fn ready_hooks(&self) -> &[ReadyHookFn] {
        &self.ready_hooks
    }

    /// Accessor for the dependencies on other modules for this module.
    pub fn dependencies(&self) -> &HashSet<String> {
        &self.dependencies
    }

    /// Accessor for whether or not this command should be restricted by default.
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// Whether only the bot owner may use this module's command.
    pub fn is_owner_only(&self) -> bool {
        self.owner_only
    }
}

/// Every module the bot ships with, in load order.
pub fn standard_modules() -> Vec<Module> {
    vec![
        base_hooks::base_hooks(),
        privilege::privilege_module(),
        config::config_module(),
        help::help_module(),
        prune::prune_module(),
        mod_log::mod_log_module(),
        mod_log::reason_module(),
        raid_protect::raid_protect_module(),
        gw2::key::key_module(),
        gw2::account::account_module(),
        gw2::account::li_module(),
        gw2::character::character_module(),
        gw2::progress::bosses_module(),
        gw2::progress::cats_module(),
        gw2::wallet::wallet_module(),
        gw2::guild::guild_module(),
        gw2::pvp::pvp_module(),
        gw2::wvw::wvw_module(),
        gw2::tp::tp_module(),
        gw2::tp::search_module(),
        gw2::skill::skill_module(),
        gw2::gem::gem_module(),
        gw2::daily::daily_module(),
        gw2::quaggan::quaggan_module(),
        gw2::notifiers::update_notifier_module(),
        gw2::notifiers::news_feed_module(),
        gw2::notifiers::arcdps_module(),
        gw2::database::database_module(),
    ]
}
