//! Generic pairs: type parameters carry over to the projected declarations,
//! mappings bound each parameter onto a fresh target parameter, and
//! `instantiate` requests emit closed aliases.

use dtoforge::prelude::*;

#[dto_module]
mod model {
    #[dto(suffix = "Dto")]
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Customer {
        pub name: String,
    }

    #[dto(suffix = "Dto", instantiate(Page<Customer>))]
    #[derive(Clone, Debug, Default)]
    pub struct Page<T> {
        pub items: Vec<T>,
        pub total: u64,
    }
}

use model::{Customer, CustomerDto, Page, PageCustomerDto, PageDto};

fn sample() -> Page<Customer> {
    Page {
        items: vec![
            Customer { name: "Ada".into() },
            Customer { name: "Grace".into() },
        ],
        total: 2,
    }
}

#[test]
fn test_generic_pair_maps_parameter_wise() {
    let dto: PageDto<CustomerDto> = sample().to_dto();
    assert_eq!(dto.total, 2);
    assert_eq!(dto.items[0].name, "Ada");
}

#[test]
fn test_generic_backward_roundtrip() {
    let dto: PageDto<CustomerDto> = sample().to_dto();
    let back: Page<Customer> = dto.to_net();
    assert_eq!(back.items, sample().items);
    assert_eq!(back.total, 2);
}

#[test]
fn test_identity_instantiation() {
    // An unprojected parameter maps through the blanket identity.
    let page = Page {
        items: vec!["a".to_string(), "b".to_string()],
        total: 2,
    };
    let dto: PageDto<String> = page.to_dto();
    assert_eq!(dto.items, vec!["a", "b"]);
}

#[test]
fn test_instantiate_emits_closed_alias() {
    let dto: PageCustomerDto = sample().to_dto();
    assert_eq!(dto.items.len(), 2);
    let same: PageDto<CustomerDto> = dto;
    assert_eq!(same.total, 2);
}

#[test]
fn test_generic_entry_point_composes() {
    fn relay<S, T>(source: &S) -> T
    where
        S: MapTo<T>,
    {
        source.map_to()
    }
    let dto: PageDto<CustomerDto> = relay(&sample());
    assert_eq!(dto.items[1].name, "Grace");
}
