//! Example diagrams.
//!
//! - `property`: the property agency case study (Connolly & Begg)
//! - `dependent`: employees, departments, projects and their dependents
//! - `vertabelo`: <https://vertabelo.com/blog/chen-erd-notation/>

use std::fmt;
use std::sync::Arc;

use crate::er_ast::{Count, Entity, Relation};
use crate::er_layout::LayoutOptions;
use crate::er_parser::parse_attributes;
use crate::error::ErdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoKind {
    Property,
    Dependent,
    Vertabelo,
}

impl DemoKind {
    pub const ALL: [DemoKind; 3] = [DemoKind::Property, DemoKind::Dependent, DemoKind::Vertabelo];

    pub fn name(self) -> &'static str {
        match self {
            DemoKind::Property => "property",
            DemoKind::Dependent => "dependent",
            DemoKind::Vertabelo => "vertabelo",
        }
    }

    pub fn build(self) -> Result<Demo, ErdError> {
        match self {
            DemoKind::Property => property(),
            DemoKind::Dependent => dependent(),
            DemoKind::Vertabelo => vertabelo(),
        }
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct Demo {
    pub entities: Vec<Arc<Entity>>,
    pub relations: Vec<Relation>,
    pub layout: LayoutOptions,
}

impl Demo {
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for entity in &self.entities {
            out.push_str(&entity.name);
            if entity.is_weak() {
                out.push_str(" (weak)");
            }
            out.push('\n');
            for attr in &entity.attributes {
                for line in attr.tree().lines() {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        for relation in &self.relations {
            out.push_str(&relation.to_string());
            out.push('\n');
        }
        out
    }
}

fn quick(name: &str, definitions: &[&str]) -> Result<Arc<Entity>, ErdError> {
    Ok(Arc::new(Entity::parse(name, definitions.iter().copied())?))
}

pub fn property() -> Result<Demo, ErdError> {
    let staff = quick("Staff", &["*staffNo"])?;
    let branch = quick("Branch", &["*branchNo"])?;
    let client = quick("Client", &["*clientNo"])?;
    let lease = quick("Lease", &["*leaseNo"])?;
    let preference = quick("Preference", &[])?;
    let rent_property = quick("PropertyForRent", &["*propertyNo"])?;
    let private_owner = quick("PrivateOwner", &["*ownerNo"])?;
    let business_owner = quick("BusinessOwner", &["*bName"])?;
    let newspaper = quick("Newspaper", &["*newspaperName"])?;

    let relations = vec![
        Relation::builder()
            .entity((&staff, Count::ZeroOrOne, "Supervisor"))
            .entity((&staff, Count::Any, "Supervisee"))
            .name("Supervises")
            .build()?,
        Relation::builder()
            .entity((&staff, Count::Exactly(1)))
            .entity((&branch, Count::ZeroOrOne))
            .name("Manages")
            .attributes(parse_attributes("mgrStartDate bonus".split_whitespace())?)
            .build()?,
        Relation::builder()
            .entity((&branch, Count::Exactly(1)))
            .entity((&staff, Count::AtLeastOne))
            .name("Has")
            .build()?,
        Relation::builder()
            .entity((&staff, Count::Exactly(1)))
            .entity((&branch, Count::Exactly(1)))
            .entity((&client, Count::Any))
            .name("Registers")
            .attributes(parse_attributes(["dateJoined"])?)
            .build()?,
        Relation::builder()
            .entity((&client, Count::Exactly(1)))
            .entity((&preference, Count::Exactly(1)))
            .name("States")
            .build()?,
        Relation::builder()
            .entity((&client, Count::Exactly(1)))
            .entity((&lease, Count::Any))
            .name("Holds")
            .build()?,
        Relation::builder()
            .entity((&lease, Count::Any))
            .entity((&rent_property, Count::Exactly(1)))
            .name("LeasedBy")
            .build()?,
        Relation::builder()
            .entity((&staff, Count::ZeroOrOne))
            .entity((&rent_property, Count::Any))
            .name("Oversees")
            .build()?,
        Relation::builder()
            .entity((&branch, Count::Exactly(1)))
            .entity((&rent_property, Count::AtLeastOne))
            .name("Offers")
            .build()?,
        Relation::builder()
            .entity((&private_owner, Count::ZeroOrOne))
            .entity((&rent_property, Count::AtLeastOne))
            .name("POwns")
            .build()?,
        Relation::builder()
            .entity((&business_owner, Count::ZeroOrOne))
            .entity((&rent_property, Count::AtLeastOne))
            .name("BOwns")
            .build()?,
        Relation::builder()
            .entity((&newspaper, Count::Any))
            .entity((&rent_property, Count::AtLeastOne))
            .name("Advertises")
            .attributes(parse_attributes("dateAdvert cost".split_whitespace())?)
            .build()?,
    ];

    Ok(Demo {
        entities: vec![
            staff,
            branch,
            client,
            lease,
            preference,
            rent_property,
            private_owner,
            business_owner,
            newspaper,
        ],
        relations,
        layout: LayoutOptions::default(),
    })
}

pub fn dependent() -> Result<Demo, ErdError> {
    let employee = quick(
        "Employee",
        &["Name: Fname Lname", "Address", "*NINumber", "Salary", "Sex", "Birthdate"],
    )?;
    let department = quick("Department", &["*Name", "*Number", "Locations[]"])?;
    let project = quick("Project", &["*Name", "*Number", "Location"])?;
    let dependent = quick("Dependent", &["+Name", "Sex", "Birthdate", "Relationship"])?;

    let relations = vec![
        Relation::builder()
            .entity((&employee, Count::Any, "Supervisee"))
            .entity((&employee, Count::ZeroOrOne, "Supervisor"))
            .name("Supervises")
            .build()?,
        Relation::builder()
            .entity((&dependent, Count::Any))
            .entity((&employee, Count::Exactly(1)))
            .name("Dependents-Of")
            .identifying(true)
            .build()?,
        Relation::builder()
            .entity((&employee, Count::AtLeastOne))
            .entity((&project, Count::AtLeastOne))
            .name("Works-On")
            .attributes(parse_attributes(["Hours"])?)
            .build()?,
        Relation::builder()
            .entity((&project, Count::Any))
            .entity((&department, Count::ZeroOrOne))
            .name("Controls")
            .build()?,
        Relation::builder()
            .entity((&employee, Count::Exactly(1)))
            .entity((&department, Count::ZeroOrOne))
            .name("Manages")
            .build()?,
        Relation::builder()
            .entity((&employee, Count::AtLeastOne))
            .entity((&department, Count::Exactly(1)))
            .name("Works-For")
            .build()?,
    ];

    Ok(Demo {
        entities: vec![employee, department, project, dependent],
        relations,
        layout: LayoutOptions::default(),
    })
}

pub fn vertabelo() -> Result<Demo, ErdError> {
    let product = quick(
        "PRODUCT",
        &["NAME", "*SKU", "PRICE EXCL. VAT", "VAT RATE", "~PRICE INCL. VAT"],
    )?;
    let student = quick(
        "STUDENT",
        &[
            "*STUDENT ID",
            "LAST NAME",
            "FIRST NAME",
            "~AGE",
            "DATE OF BIRTH",
            "EMAIL[]",
            "MAJOR",
            "ADDRESS: COUNTRY STATE CITY ZIPCODE STREETNAME STREETNO APARTMENTNO",
        ],
    )?;
    let book = quick("BOOK", &["*BOOK ID", "TITLE"])?;
    let chapter = quick("CHAPTER", &["+CHAPTER ID", "TITLE"])?;

    let contains = Relation::builder()
        .entity((&book, Count::Exactly(1)))
        .entity((&chapter, Count::Any))
        .name("CONTAINS")
        .identifying(true)
        .build()?;

    Ok(Demo {
        entities: vec![product, student, book, chapter],
        relations: vec![contains],
        layout: LayoutOptions {
            use_neato: true,
            ..LayoutOptions::default()
        },
    })
}
