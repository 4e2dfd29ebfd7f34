// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! `Display` impls for operator-facing output (`show route`-style dumps).

use crate::nexthop::{NextHop, NextHopAction, NextHopEntry};
use crate::route::{Forwarding, Route};
use crate::table::RouteTable;
use std::fmt;

impl fmt::Display for NextHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextHop::Unresolved {
                address, ifindex, ..
            } => match ifindex {
                Some(ifx) => write!(f, "via {address} if{ifx} (unresolved)"),
                None => write!(f, "via {address} (unresolved)"),
            },
            NextHop::Resolved {
                address, ifindex, ..
            } => write!(f, "via {address} if{ifindex}"),
        }
    }
}

impl fmt::Display for NextHopEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            NextHopAction::Drop => write!(f, "drop [{}]", self.admin_distance),
            NextHopAction::ToCpu => write!(f, "to-cpu [{}]", self.admin_distance),
            NextHopAction::NextHops => {
                write!(f, "[{}]", self.admin_distance)?;
                for nh in &self.nexthops {
                    write!(f, " {nh}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Forwarding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Forwarding::Unresolved => write!(f, "unresolved"),
            Forwarding::Drop => write!(f, "drop"),
            Forwarding::ToCpu => write!(f, "to-cpu"),
            Forwarding::Unresolvable => write!(f, "unresolvable"),
            Forwarding::NextHops(nhs) => {
                for (i, nh) in nhs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{nh}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.prefix, self.forwarding)?;
        if let Some(class_id) = self.class_id {
            write!(f, " class={class_id}")?;
        }
        for (client, entry) in &self.client_entries {
            let marker = if self.best_entry.as_ref() == Some(entry) {
                "*"
            } else {
                " "
            };
            write!(f, "\n  {marker}{client}: {entry}")?;
        }
        Ok(())
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, route) in self.iter_v4() {
            writeln!(f, "{route}")?;
        }
        for (_, route) in self.iter_v6() {
            writeln!(f, "{route}")?;
        }
        Ok(())
    }
}
