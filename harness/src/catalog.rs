//! Static catalog of load-test scenarios
//!
//! Scenarios are declared once, in the order they run by default.
//! The catalog is immutable for the lifetime of the process.

use thiserror::Error;

/// Errors that can occur when resolving catalog entries
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Test not found: {0}")]
    NotFound(String),
}

/// One named load-test configuration.
///
/// `duration` is kept as the load tool's own span syntax (e.g. `"10s"`)
/// since it is passed through verbatim on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestScenario {
    /// Unique key, also the key under which results are reported
    pub name: &'static str,
    /// Worker threads for the load tool
    pub threads: u32,
    /// Simultaneous connections across all threads
    pub connections: u32,
    /// Test duration in the load tool's span syntax
    pub duration: &'static str,
    /// Request path on the server-under-test
    pub path: &'static str,
    /// Human-readable description for the listing
    pub description: &'static str,
}

/// Tests run in this order by default.
pub const CATALOG: &[TestScenario] = &[
    TestScenario {
        name: "loadavg40",
        threads: 20,
        connections: 40,
        duration: "10s",
        path: "/loadavg",
        description: "Can your server handle 40 parallel connections requesting /loadavg?",
    },
    TestScenario {
        name: "loadavg500",
        threads: 20,
        connections: 500,
        duration: "10s",
        path: "/loadavg",
        description: "500 connections, each repeatedly requesting /loadavg (~80 bytes of \
                      HTTP body). This should be enough to make the server CPU bound.",
    },
    TestScenario {
        name: "loadavg10k",
        threads: 20,
        connections: 10000,
        duration: "10s",
        path: "/loadavg",
        description: "Handling 10k simultaneous connections has been a scalability target \
                      since 1999 (http://www.kegel.com/c10k.html). Can your server handle it?",
    },
    TestScenario {
        name: "wwwcsvt100",
        threads: 20,
        connections: 100,
        duration: "10s",
        path: "/files/www.cs.vt.edu-20160222.html",
        description: "A snapshot of a department home page, about 23KB (not counting \
                      embedded objects). If 100 clients accessed it simultaneously, how \
                      much throughput could they expect?",
    },
    TestScenario {
        name: "doom100",
        threads: 20,
        connections: 40,
        duration: "10s",
        path: "/files/large",
        description: "The combined size of all objects on an average web page is about \
                      2,250kBytes. If these were transferred as a single object, how much \
                      throughput would you get? This should max out a 10Gbps link, even \
                      with only 40 connections.",
    },
];

/// All scenarios in declaration order.
pub fn all() -> &'static [TestScenario] {
    CATALOG
}

/// Look up a scenario by name.
pub fn lookup(name: &str) -> Result<&'static TestScenario, CatalogError> {
    CATALOG
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| CatalogError::NotFound(name.to_string()))
}

/// Print the catalog with descriptions (the `-l` listing).
pub fn print_listing() {
    for test in CATALOG {
        println!();
        println!("Test:           {}", test.name);
        println!("Connections:    {}", test.connections);
        println!("Duration:       {}", test.duration);
        println!("Path:           {}", test.path);
        println!("Description:    {}", test.description);
    }
    println!();
}
